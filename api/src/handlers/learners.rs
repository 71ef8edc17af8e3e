use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::models::{AvailabilityEntry, TaskView};
use common::planner::{validate_entries, ScheduleOutcome};

/// Request to enroll a learner in a course
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub course_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub learner_id: Uuid,
    pub course_id: Uuid,
    pub work_items_created: u64,
}

/// Weekly availability, one entry per weekday (0 = Sunday)
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityBody {
    pub availabilities: Vec<AvailabilityEntry>,
}

/// Enroll a learner and create one pending work item per topic
#[tracing::instrument(skip(state, req), fields(course_id = %req.course_id))]
pub async fn enroll(
    State(state): State<AppState>,
    Path(learner_id): Path<Uuid>,
    Json(req): Json<EnrollRequest>,
) -> Result<Json<SuccessResponse<EnrollmentResponse>>, ErrorResponse> {
    let created = state.courses().enroll(learner_id, req.course_id).await?;

    Ok(Json(SuccessResponse::new(EnrollmentResponse {
        learner_id,
        course_id: req.course_id,
        work_items_created: created,
    })))
}

/// Replace a learner's weekly availability
#[tracing::instrument(skip(state, body), fields(entry_count = body.availabilities.len()))]
pub async fn put_availability(
    State(state): State<AppState>,
    Path(learner_id): Path<Uuid>,
    Json(body): Json<AvailabilityBody>,
) -> Result<Json<SuccessResponse<AvailabilityBody>>, ErrorResponse> {
    validate_entries(&body.availabilities)?;

    let repo = state.availability();
    repo.replace(learner_id, &body.availabilities).await?;
    let availabilities = repo.find_by_learner(learner_id).await?;

    Ok(Json(SuccessResponse::new(AvailabilityBody { availabilities })))
}

#[tracing::instrument(skip(state))]
pub async fn get_availability(
    State(state): State<AppState>,
    Path(learner_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<AvailabilityBody>>, ErrorResponse> {
    let availabilities = state.availability().find_by_learner(learner_id).await?;
    Ok(Json(SuccessResponse::new(AvailabilityBody { availabilities })))
}

/// Distribute the learner's pending work starting today
#[tracing::instrument(skip(state))]
pub async fn generate_schedule(
    State(state): State<AppState>,
    Path(learner_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<ScheduleOutcome>>, ErrorResponse> {
    let outcome = state.planner.generate_schedule(learner_id).await?;
    Ok(Json(SuccessResponse::new(outcome)))
}

/// Re-pack all pending work from today, replacing earlier dates
#[tracing::instrument(skip(state))]
pub async fn recalculate_schedule(
    State(state): State<AppState>,
    Path(learner_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<ScheduleOutcome>>, ErrorResponse> {
    let outcome = state.planner.recalculate(learner_id).await?;
    Ok(Json(SuccessResponse::new(outcome)))
}

/// List a learner's work items, earliest date first and undated last
#[tracing::instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    Path(learner_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Vec<TaskView>>>, ErrorResponse> {
    let tasks = state.work_items().list_for_learner(learner_id).await?;
    Ok(Json(SuccessResponse::new(tasks)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_body_deserialization() {
        let body: AvailabilityBody = serde_json::from_str(
            r#"{"availabilities":[{"week_day":1,"hours_per_day":2},{"week_day":3,"hours_per_day":1}]}"#,
        )
        .unwrap();
        assert_eq!(body.availabilities.len(), 2);
        assert_eq!(body.availabilities[0].week_day, 1);
        assert_eq!(body.availabilities[0].hours_per_day, 2);
    }

    #[test]
    fn test_enroll_request_requires_course_id() {
        assert!(serde_json::from_str::<EnrollRequest>("{}").is_err());
    }
}
