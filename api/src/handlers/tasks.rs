use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::models::WorkItem;

/// Mark a work item done
///
/// Completed items keep their date and are skipped by later schedule runs.
#[tracing::instrument(skip(state))]
pub async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<WorkItem>>, ErrorResponse> {
    let item = state.work_items().complete(task_id).await?;
    Ok(Json(SuccessResponse::new(item)))
}
