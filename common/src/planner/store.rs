// Storage seams consumed by the planner service

use super::queue::QueuedItem;
use crate::errors::StorageError;
use crate::models::AvailabilityEntry;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// Read access to a learner's weekly availability
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn availability(&self, learner_id: Uuid) -> Result<Vec<AvailabilityEntry>, StorageError>;
}

/// Pending queue reads and scheduled-date writes
#[async_trait]
pub trait WorkItemStore: Send + Sync {
    /// Pending items of the learner, ordered by topic order index then creation
    async fn pending_queue(&self, learner_id: Uuid) -> Result<Vec<QueuedItem>, StorageError>;

    /// Set the scheduled date of a pending item
    async fn assign_date(&self, item_id: Uuid, date: NaiveDate) -> Result<(), StorageError>;

    /// Remove the scheduled date of a pending item
    async fn clear_date(&self, item_id: Uuid) -> Result<(), StorageError>;
}
