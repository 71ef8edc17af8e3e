// Property-based tests for schedule distribution

use chrono::{Datelike, Duration, NaiveDate};
use common::planner::{distribute_within, AvailabilityProfile, QueuedItem, WorkQueue};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

fn week_strategy() -> impl Strategy<Value = [u32; 7]> {
    prop::array::uniform7(prop_oneof![Just(0u32), 15u32..=240u32])
        .prop_filter("at least one open day", |week| week.iter().any(|m| *m > 0))
}

fn queue_strategy() -> impl Strategy<Value = WorkQueue> {
    prop::collection::vec((1u32..=300u32, 0i32..20i32), 0..40).prop_map(|specs| {
        specs
            .into_iter()
            .map(|(duration_minutes, order_index)| QueuedItem {
                item_id: Uuid::new_v4(),
                duration_minutes,
                order_index,
            })
            .collect()
    })
}

fn anchor_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn weekday(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

proptest! {
    /// Property: capacity respected
    ///
    /// *For any* profile and queue, the minutes placed on a day never exceed
    /// that day's capacity, except a single oversized item placed alone.
    #[test]
    fn property_capacity_respected(
        week in week_strategy(),
        queue in queue_strategy(),
        anchor in anchor_strategy(),
    ) {
        let profile = AvailabilityProfile::from_minutes(week);
        let plan = distribute_within(&profile, &queue, anchor, 730);

        let durations: HashMap<Uuid, u32> = queue
            .items()
            .iter()
            .map(|item| (item.item_id, item.duration_minutes))
            .collect();
        let mut per_day: HashMap<NaiveDate, Vec<u32>> = HashMap::new();
        for assignment in &plan.assignments {
            per_day
                .entry(assignment.date)
                .or_default()
                .push(durations[&assignment.item_id]);
        }

        for (date, placed) in per_day {
            let capacity = week[weekday(date)];
            let total: u32 = placed.iter().sum();
            if total > capacity {
                prop_assert_eq!(placed.len(), 1, "overfull day {} holds several items", date);
                prop_assert!(placed[0] > capacity);
            }
        }
    }

    /// Property: closed-day exclusion
    ///
    /// *For any* plan, no item lands on a weekday with zero availability.
    #[test]
    fn property_closed_days_excluded(
        week in week_strategy(),
        queue in queue_strategy(),
        anchor in anchor_strategy(),
    ) {
        let profile = AvailabilityProfile::from_minutes(week);
        let plan = distribute_within(&profile, &queue, anchor, 730);

        for assignment in &plan.assignments {
            prop_assert!(week[weekday(assignment.date)] > 0);
        }
    }

    /// Property: order preservation
    ///
    /// *For any* two items where one precedes the other in the queue, the
    /// earlier item's date is on or before the later item's date.
    #[test]
    fn property_queue_order_preserved(
        week in week_strategy(),
        queue in queue_strategy(),
        anchor in anchor_strategy(),
    ) {
        let profile = AvailabilityProfile::from_minutes(week);
        let plan = distribute_within(&profile, &queue, anchor, 730);

        let placed: Vec<Uuid> = plan.assignments.iter().map(|a| a.item_id).collect();
        let queued: Vec<Uuid> = queue
            .items()
            .iter()
            .take(placed.len())
            .map(|item| item.item_id)
            .collect();
        prop_assert_eq!(placed, queued);

        for pair in plan.assignments.windows(2) {
            prop_assert!(pair[0].date <= pair[1].date);
        }
    }

    /// Property: dates never precede the anchor
    #[test]
    fn property_dates_on_or_after_anchor(
        week in week_strategy(),
        queue in queue_strategy(),
        anchor in anchor_strategy(),
    ) {
        let profile = AvailabilityProfile::from_minutes(week);
        let plan = distribute_within(&profile, &queue, anchor, 730);

        for assignment in &plan.assignments {
            prop_assert!(assignment.date >= anchor);
        }
    }

    /// Property: every queued item is accounted for exactly once
    ///
    /// Each item appears either in the assignments or in the unscheduled
    /// list, never both and never twice.
    #[test]
    fn property_every_item_exactly_once(
        week in week_strategy(),
        queue in queue_strategy(),
        anchor in anchor_strategy(),
        max_days in 1u32..60u32,
    ) {
        let profile = AvailabilityProfile::from_minutes(week);
        let plan = distribute_within(&profile, &queue, anchor, max_days);

        let mut seen = HashSet::new();
        for id in plan
            .assignments
            .iter()
            .map(|a| a.item_id)
            .chain(plan.unscheduled.iter().copied())
        {
            prop_assert!(seen.insert(id), "item {} appears twice", id);
        }
        prop_assert_eq!(seen.len(), queue.len());
    }

    /// Property: termination within the day bound
    ///
    /// *For any* bound, no more than `max_days` days are walked and no
    /// assignment falls outside the window.
    #[test]
    fn property_terminates_within_bound(
        week in week_strategy(),
        queue in queue_strategy(),
        anchor in anchor_strategy(),
        max_days in 1u32..60u32,
    ) {
        let profile = AvailabilityProfile::from_minutes(week);
        let plan = distribute_within(&profile, &queue, anchor, max_days);

        prop_assert!(plan.days_processed <= max_days);
        let last_allowed = anchor + Duration::days(i64::from(max_days) - 1);
        for assignment in &plan.assignments {
            prop_assert!(assignment.date <= last_allowed);
        }
    }

    /// Property: a closed week places nothing
    #[test]
    fn property_closed_week_places_nothing(
        queue in queue_strategy(),
        anchor in anchor_strategy(),
    ) {
        let profile = AvailabilityProfile::from_minutes([0; 7]);
        let plan = distribute_within(&profile, &queue, anchor, 730);

        prop_assert!(plan.assignments.is_empty());
        prop_assert_eq!(plan.days_processed, 0);
        prop_assert_eq!(plan.unscheduled.len(), queue.len());
    }

    /// Property: determinism
    ///
    /// Running the same inputs twice yields the same plan, which is what makes
    /// recalculation with an unchanged anchor idempotent.
    #[test]
    fn property_distribution_is_deterministic(
        week in week_strategy(),
        queue in queue_strategy(),
        anchor in anchor_strategy(),
    ) {
        let profile = AvailabilityProfile::from_minutes(week);
        let first = distribute_within(&profile, &queue, anchor, 730);
        let second = distribute_within(&profile, &queue, anchor, 730);

        prop_assert_eq!(first, second);
    }
}
