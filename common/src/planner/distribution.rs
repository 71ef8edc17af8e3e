// Greedy forward distribution of pending work over calendar days
//
// A single deterministic pass: walk days from the anchor, fill each open day
// with queue items in order until the next one would overflow it, skip
// closed days, and stop when the queue is empty or the day bound is reached.

use super::profile::AvailabilityProfile;
use super::queue::WorkQueue;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Default bound on calendar days walked by one run (two years)
pub const MAX_DAYS: u32 = 730;

/// A work item placed on a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub item_id: Uuid,
    pub date: NaiveDate,
}

/// Result of a distribution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionPlan {
    /// Placements in queue order; dates never decrease
    pub assignments: Vec<Assignment>,
    /// Items still queued when the day bound was reached
    pub unscheduled: Vec<Uuid>,
    pub days_processed: u32,
}

impl DistributionPlan {
    pub fn date_of(&self, item_id: Uuid) -> Option<NaiveDate> {
        self.assignments
            .iter()
            .find(|a| a.item_id == item_id)
            .map(|a| a.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.assignments.last().map(|a| a.date)
    }

    pub fn is_complete(&self) -> bool {
        self.unscheduled.is_empty()
    }
}

/// Distribute `queue` over days starting at `anchor`, bounded by [`MAX_DAYS`]
pub fn distribute(
    profile: &AvailabilityProfile,
    queue: &WorkQueue,
    anchor: NaiveDate,
) -> DistributionPlan {
    distribute_within(profile, queue, anchor, MAX_DAYS)
}

/// Distribute `queue` over at most `max_days` calendar days starting at `anchor`
///
/// An item longer than a whole day is placed alone on the first open day
/// where it is the first item attempted, so it can never stall the queue.
pub fn distribute_within(
    profile: &AvailabilityProfile,
    queue: &WorkQueue,
    anchor: NaiveDate,
    max_days: u32,
) -> DistributionPlan {
    let items = queue.items();
    let mut assignments = Vec::with_capacity(items.len());
    let mut cursor = 0usize;
    let mut days_processed = 0u32;
    let mut day = anchor;

    // Nothing can ever be placed without an open weekday
    let walk = profile.has_open_day();

    while walk && cursor < items.len() && days_processed < max_days {
        let capacity = profile.minutes_on(day);

        if capacity > 0 {
            let mut used_today = 0u32;

            while let Some(item) = items.get(cursor) {
                if used_today.saturating_add(item.duration_minutes) <= capacity {
                    assignments.push(Assignment {
                        item_id: item.item_id,
                        date: day,
                    });
                    used_today += item.duration_minutes;
                    cursor += 1;
                } else {
                    if used_today == 0 {
                        // Oversized: alone on this day
                        assignments.push(Assignment {
                            item_id: item.item_id,
                            date: day,
                        });
                        cursor += 1;
                    }
                    break;
                }
            }
        }

        days_processed += 1;
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    let unscheduled = items[cursor..].iter().map(|item| item.item_id).collect();

    DistributionPlan {
        assignments,
        unscheduled,
        days_processed,
    }
}
