// Work item repository: pending queue reads, schedule writes, completion

use crate::db::DbPool;
use crate::errors::{DatabaseError, StorageError};
use crate::models::{TaskView, WorkItem, WorkItemStatus};
use crate::planner::{QueuedItem, WorkItemStore};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

const WORK_ITEM_COLUMNS: &str = r#"
    w.id, w.learner_id, w.topic_id, w.status, w.scheduled_date,
    w.completed_at, w.created_at
"#;

/// Repository for learner work items
#[derive(Clone)]
pub struct WorkItemRepository {
    pool: DbPool,
}

impl WorkItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Pending items in study order
    ///
    /// Ordered by topic order index, then by creation sequence so items
    /// sharing an index keep the order they were created in.
    #[instrument(skip(self))]
    pub async fn find_pending_ordered(
        &self,
        learner_id: Uuid,
    ) -> Result<Vec<QueuedItem>, DatabaseError> {
        let rows = sqlx::query(
            r#"
            SELECT w.id, t.estimated_minutes, t.order_index
            FROM work_items w
            JOIN topics t ON t.id = w.topic_id
            WHERE w.learner_id = $1 AND w.status = 'pending'
            ORDER BY t.order_index ASC, w.seq ASC
            "#,
        )
        .bind(learner_id)
        .fetch_all(self.pool.pool())
        .await?;

        let mut queue = Vec::with_capacity(rows.len());
        for row in rows {
            let item_id: Uuid = row.try_get("id")?;
            let minutes: i32 = row.try_get("estimated_minutes")?;
            let duration_minutes = u32::try_from(minutes).map_err(|_| {
                DatabaseError::QueryFailed(format!(
                    "Work item {} has negative duration {}",
                    item_id, minutes
                ))
            })?;

            queue.push(QueuedItem {
                item_id,
                duration_minutes,
                order_index: row.try_get("order_index")?,
            });
        }

        tracing::debug!(count = queue.len(), "Loaded pending queue");
        Ok(queue)
    }

    /// Set the scheduled date of a pending item; done items are left alone
    #[instrument(skip(self))]
    pub async fn set_scheduled_date(
        &self,
        item_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            UPDATE work_items
            SET scheduled_date = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(item_id)
        .bind(date)
        .execute(self.pool.pool())
        .await?;

        Ok(())
    }

    /// Mark an item done
    ///
    /// Completing an item twice keeps the first completion timestamp.
    #[instrument(skip(self))]
    pub async fn complete(&self, item_id: Uuid) -> Result<WorkItem, DatabaseError> {
        let query = format!(
            r#"
            UPDATE work_items w
            SET status = 'done', completed_at = COALESCE(w.completed_at, NOW())
            WHERE w.id = $1
            RETURNING {}
            "#,
            WORK_ITEM_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(item_id)
            .fetch_optional(self.pool.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Work item {}", item_id)))?;

        let item = work_item_from_row(&row)?;
        tracing::info!(item_id = %item_id, learner_id = %item.learner_id, "Work item completed");
        Ok(item)
    }

    /// All items of a learner with topic and subject details
    ///
    /// Ordered by scheduled date, unscheduled items last, then study order.
    #[instrument(skip(self))]
    pub async fn list_for_learner(&self, learner_id: Uuid) -> Result<Vec<TaskView>, DatabaseError> {
        let query = format!(
            r#"
            SELECT {},
                t.name AS topic_name, t.estimated_minutes, t.order_index,
                s.name AS subject_name, s.color AS subject_color
            FROM work_items w
            JOIN topics t ON t.id = w.topic_id
            JOIN subjects s ON s.id = t.subject_id
            WHERE w.learner_id = $1
            ORDER BY w.scheduled_date ASC NULLS LAST, t.order_index ASC, w.seq ASC
            "#,
            WORK_ITEM_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(learner_id)
            .fetch_all(self.pool.pool())
            .await?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            tasks.push(TaskView {
                item: work_item_from_row(&row)?,
                topic_name: row.try_get("topic_name")?,
                estimated_minutes: row.try_get("estimated_minutes")?,
                order_index: row.try_get("order_index")?,
                subject_name: row.try_get("subject_name")?,
                subject_color: row.try_get("subject_color")?,
            });
        }

        Ok(tasks)
    }
}

fn work_item_from_row(row: &PgRow) -> Result<WorkItem, DatabaseError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<WorkItemStatus>()
        .map_err(DatabaseError::QueryFailed)?;

    Ok(WorkItem {
        id: row.try_get("id")?,
        learner_id: row.try_get("learner_id")?,
        topic_id: row.try_get("topic_id")?,
        status,
        scheduled_date: row.try_get("scheduled_date")?,
        completed_at: row.try_get("completed_at")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl WorkItemStore for WorkItemRepository {
    async fn pending_queue(&self, learner_id: Uuid) -> Result<Vec<QueuedItem>, StorageError> {
        Ok(self.find_pending_ordered(learner_id).await?)
    }

    async fn assign_date(&self, item_id: Uuid, date: NaiveDate) -> Result<(), StorageError> {
        Ok(self.set_scheduled_date(item_id, Some(date)).await?)
    }

    async fn clear_date(&self, item_id: Uuid) -> Result<(), StorageError> {
        Ok(self.set_scheduled_date(item_id, None).await?)
    }
}
