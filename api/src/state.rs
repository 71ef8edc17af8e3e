use std::sync::Arc;

use common::config::Settings;
use common::db::repositories::{AvailabilityRepository, CourseRepository, WorkItemRepository};
use common::db::DbPool;
use common::planner::PlannerService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub planner: Arc<PlannerService>,
    pub config: Arc<Settings>,
}

impl AppState {
    pub fn new(db_pool: DbPool, planner: PlannerService, config: Settings) -> Self {
        Self {
            db_pool,
            planner: Arc::new(planner),
            config: Arc::new(config),
        }
    }

    pub fn courses(&self) -> CourseRepository {
        CourseRepository::new(self.db_pool.clone())
    }

    pub fn availability(&self) -> AvailabilityRepository {
        AvailabilityRepository::new(self.db_pool.clone())
    }

    pub fn work_items(&self) -> WorkItemRepository {
        WorkItemRepository::new(self.db_pool.clone())
    }
}
