use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::models::{CourseOutline, NewCourse};

/// Create a course with its subjects and topics
#[tracing::instrument(skip(state, req), fields(title = %req.title))]
pub async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<NewCourse>,
) -> Result<Json<SuccessResponse<CourseOutline>>, ErrorResponse> {
    req.validate()?;

    let outline = state.courses().create(&req).await?;

    Ok(Json(SuccessResponse::new(outline)))
}

/// Get a course with subjects and topics in study order
#[tracing::instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<CourseOutline>>, ErrorResponse> {
    let outline = state
        .courses()
        .find_outline(course_id)
        .await?
        .ok_or_else(|| ErrorResponse::new("not_found", format!("Course {} not found", course_id)))?;

    Ok(Json(SuccessResponse::new(outline)))
}
