// Schedule runs: lock, read, distribute, write back

use super::distribution::distribute_within;
use super::policy::{PlanTrigger, ReschedulePolicy};
use super::profile::AvailabilityProfile;
use super::queue::WorkQueue;
use super::store::{AvailabilityStore, WorkItemStore};
use crate::errors::PlanError;
use crate::lock::{learner_resource, DistributedLock, LockGuard};
use crate::telemetry;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleOutcome {
    pub trigger: PlanTrigger,
    pub anchor_date: NaiveDate,
    pub scheduled: usize,
    /// Items left without a date because the day bound was reached
    pub unscheduled: usize,
    pub days_processed: u32,
    pub last_scheduled_date: Option<NaiveDate>,
}

/// Runs schedule distribution for one learner at a time
pub struct PlannerService {
    availability: Arc<dyn AvailabilityStore>,
    work_items: Arc<dyn WorkItemStore>,
    lock: Arc<dyn DistributedLock>,
    policy: ReschedulePolicy,
    lock_ttl: Duration,
}

impl PlannerService {
    pub fn new(
        availability: Arc<dyn AvailabilityStore>,
        work_items: Arc<dyn WorkItemStore>,
        lock: Arc<dyn DistributedLock>,
        policy: ReschedulePolicy,
        lock_ttl: Duration,
    ) -> Self {
        Self {
            availability,
            work_items,
            lock,
            policy,
            lock_ttl,
        }
    }

    /// First distribution of a learner's backlog, anchored today
    pub async fn generate_schedule(&self, learner_id: Uuid) -> Result<ScheduleOutcome, PlanError> {
        self.run(learner_id, PlanTrigger::Generate, Utc::now()).await
    }

    /// Re-pack every pending item from today, replacing earlier dates
    pub async fn recalculate(&self, learner_id: Uuid) -> Result<ScheduleOutcome, PlanError> {
        self.run(learner_id, PlanTrigger::Recalculate, Utc::now()).await
    }

    /// Run distribution as of `now`
    ///
    /// Holds the learner's lock for the whole read-distribute-write cycle.
    /// Writes are not rolled back on failure; a failed run can be repeated.
    #[instrument(skip(self), fields(learner_id = %learner_id, trigger = %trigger))]
    pub async fn run(
        &self,
        learner_id: Uuid,
        trigger: PlanTrigger,
        now: DateTime<Utc>,
    ) -> Result<ScheduleOutcome, PlanError> {
        let started = Instant::now();
        let result = self.run_locked(learner_id, trigger, now).await;
        let elapsed = started.elapsed().as_secs_f64();
        let trigger_label = trigger.to_string();

        match &result {
            Ok(outcome) => {
                telemetry::record_schedule_run(
                    &trigger_label,
                    outcome.scheduled,
                    outcome.unscheduled,
                    elapsed,
                );
            }
            Err(e) => {
                let reason = match e {
                    PlanError::NoAvailabilityConfigured { .. } => "no_availability",
                    PlanError::StorageFailure(_) => "storage_failure",
                    PlanError::LearnerBusy(_) => "learner_busy",
                };
                warn!(error = %e, "Schedule run failed");
                telemetry::record_schedule_failure(&trigger_label, reason, elapsed);
            }
        }

        result
    }

    async fn run_locked(
        &self,
        learner_id: Uuid,
        trigger: PlanTrigger,
        now: DateTime<Utc>,
    ) -> Result<ScheduleOutcome, PlanError> {
        let mut guard = self
            .lock
            .acquire(&learner_resource(learner_id), self.lock_ttl)
            .await?;

        let run = self.policy.plan_run(trigger, now);

        let entries = self.availability.availability(learner_id).await?;
        let profile = AvailabilityProfile::from_entries(learner_id, &entries)?;

        let queue = WorkQueue::new(self.work_items.pending_queue(learner_id).await?);
        if queue.is_empty() {
            info!(anchor_date = %run.anchor, "No pending work items, nothing to schedule");
            return Ok(ScheduleOutcome {
                trigger,
                anchor_date: run.anchor,
                scheduled: 0,
                unscheduled: 0,
                days_processed: 0,
                last_scheduled_date: None,
            });
        }

        debug!(
            pending = queue.len(),
            pending_minutes = queue.total_minutes(),
            weekly_minutes = profile.weekly_minutes(),
            "Distributing pending work"
        );

        let plan = distribute_within(&profile, &queue, run.anchor, run.max_days);

        for assignment in &plan.assignments {
            keep_alive(&mut guard).await?;
            self.work_items
                .assign_date(assignment.item_id, assignment.date)
                .await?;
        }
        for item_id in &plan.unscheduled {
            keep_alive(&mut guard).await?;
            self.work_items.clear_date(*item_id).await?;
        }

        if !plan.is_complete() {
            warn!(
                unscheduled = plan.unscheduled.len(),
                max_days = run.max_days,
                "Day bound reached before the queue was exhausted"
            );
        }

        info!(
            anchor_date = %run.anchor,
            scheduled = plan.assignments.len(),
            days_processed = plan.days_processed,
            lock = guard.resource(),
            lock_held_seconds = guard.elapsed().as_secs_f64(),
            "Schedule run complete"
        );

        Ok(ScheduleOutcome {
            trigger,
            anchor_date: run.anchor,
            scheduled: plan.assignments.len(),
            unscheduled: plan.unscheduled.len(),
            days_processed: plan.days_processed,
            last_scheduled_date: plan.last_date(),
        })
    }
}

/// Refresh the learner lock before it can lapse mid-write
///
/// A lost lock ends the run as `LearnerBusy`; dates written so far stay.
async fn keep_alive(guard: &mut LockGuard) -> Result<(), PlanError> {
    if guard.refresh_due() {
        guard.refresh().await?;
    }
    Ok(())
}
