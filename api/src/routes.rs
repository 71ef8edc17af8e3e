use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let catalog_routes = Router::new()
        .route("/api/courses", post(handlers::courses::create_course))
        .route("/api/courses/:course_id", get(handlers::courses::get_course));

    let learner_routes = Router::new()
        .route(
            "/api/learners/:learner_id/enrollments",
            post(handlers::learners::enroll),
        )
        .route(
            "/api/learners/:learner_id/availability",
            get(handlers::learners::get_availability).put(handlers::learners::put_availability),
        )
        .route(
            "/api/learners/:learner_id/schedule",
            post(handlers::learners::generate_schedule),
        )
        .route(
            "/api/learners/:learner_id/schedule/recalculate",
            post(handlers::learners::recalculate_schedule),
        )
        .route(
            "/api/learners/:learner_id/tasks",
            get(handlers::learners::list_tasks),
        )
        .route(
            "/api/tasks/:task_id/complete",
            post(handlers::tasks::complete_task),
        );

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(catalog_routes)
        .merge(learner_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
