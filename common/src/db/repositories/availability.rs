// Availability repository: weekly study budget per learner

use crate::db::DbPool;
use crate::errors::{DatabaseError, StorageError};
use crate::models::AvailabilityEntry;
use crate::planner::AvailabilityStore;
use async_trait::async_trait;
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

/// Repository for availability entries
#[derive(Clone)]
pub struct AvailabilityRepository {
    pool: DbPool,
}

impl AvailabilityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All entries of a learner, Sunday first
    #[instrument(skip(self))]
    pub async fn find_by_learner(
        &self,
        learner_id: Uuid,
    ) -> Result<Vec<AvailabilityEntry>, DatabaseError> {
        let rows = sqlx::query(
            r#"
            SELECT week_day, hours_per_day
            FROM availabilities
            WHERE learner_id = $1
            ORDER BY week_day
            "#,
        )
        .bind(learner_id)
        .fetch_all(self.pool.pool())
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(AvailabilityEntry {
                week_day: row.try_get("week_day")?,
                hours_per_day: row.try_get("hours_per_day")?,
            });
        }

        tracing::debug!(count = entries.len(), "Loaded availability entries");
        Ok(entries)
    }

    /// Replace the learner's whole profile
    ///
    /// Weekdays absent from `entries` are dropped and read back as closed.
    /// Runs in one transaction so readers never see a half-written profile.
    #[instrument(skip(self, entries), fields(entry_count = entries.len()))]
    pub async fn replace(
        &self,
        learner_id: Uuid,
        entries: &[AvailabilityEntry],
    ) -> Result<(), DatabaseError> {
        let mut tx = self
            .pool
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        sqlx::query("DELETE FROM availabilities WHERE learner_id = $1")
            .bind(learner_id)
            .execute(&mut *tx)
            .await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO availabilities (learner_id, week_day, hours_per_day)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(learner_id)
            .bind(entry.week_day)
            .bind(entry.hours_per_day)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tracing::info!(learner_id = %learner_id, "Availability profile replaced");
        Ok(())
    }
}

#[async_trait]
impl AvailabilityStore for AvailabilityRepository {
    async fn availability(&self, learner_id: Uuid) -> Result<Vec<AvailabilityEntry>, StorageError> {
        Ok(self.find_by_learner(learner_id).await?)
    }
}
