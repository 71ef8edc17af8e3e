// Weekly availability profile

use crate::errors::{PlanError, ValidationError};
use crate::models::AvailabilityEntry;
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;
use uuid::Uuid;

pub const MINUTES_PER_HOUR: u32 = 60;
pub const MAX_HOURS_PER_DAY: i16 = 24;
pub const DAYS_PER_WEEK: usize = 7;

/// Minutes available per weekday, indexed 0 = Sunday .. 6 = Saturday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AvailabilityProfile {
    minutes: [u32; DAYS_PER_WEEK],
}

impl AvailabilityProfile {
    /// Build a profile from stored entries
    ///
    /// Weekdays without an entry are closed. Fails with
    /// `NoAvailabilityConfigured` when there are no entries at all or when
    /// every entry is zero hours, since no run could place anything.
    pub fn from_entries(
        learner_id: Uuid,
        entries: &[AvailabilityEntry],
    ) -> Result<Self, PlanError> {
        let mut minutes = [0u32; DAYS_PER_WEEK];
        for entry in entries {
            let slot = usize::try_from(entry.week_day)
                .ok()
                .and_then(|day| minutes.get_mut(day));
            if let Some(slot) = slot {
                *slot = u32::try_from(entry.hours_per_day).unwrap_or(0) * MINUTES_PER_HOUR;
            }
        }

        let profile = Self { minutes };
        if !profile.has_open_day() {
            return Err(PlanError::NoAvailabilityConfigured { learner_id });
        }
        Ok(profile)
    }

    /// Build a profile directly from per-weekday minutes
    pub fn from_minutes(minutes: [u32; DAYS_PER_WEEK]) -> Self {
        Self { minutes }
    }

    /// Capacity of the weekday `date` falls on
    pub fn minutes_on(&self, date: NaiveDate) -> u32 {
        self.minutes_for_weekday(date.weekday().num_days_from_sunday() as usize)
    }

    /// Minutes for a weekday index, 0 = Sunday; out of range reads as closed
    pub fn minutes_for_weekday(&self, week_day: usize) -> u32 {
        self.minutes.get(week_day).copied().unwrap_or(0)
    }

    pub fn has_open_day(&self) -> bool {
        self.minutes.iter().any(|m| *m > 0)
    }

    pub fn weekly_minutes(&self) -> u32 {
        self.minutes.iter().sum()
    }
}

/// Check a submitted availability profile before it replaces the stored one
pub fn validate_entries(entries: &[AvailabilityEntry]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !(0..DAYS_PER_WEEK as i16).contains(&entry.week_day) {
            return Err(ValidationError::InvalidFieldValue {
                field: "week_day".to_string(),
                reason: format!("{} is outside 0 (Sunday) ..= 6 (Saturday)", entry.week_day),
            });
        }
        if !(0..=MAX_HOURS_PER_DAY).contains(&entry.hours_per_day) {
            return Err(ValidationError::InvalidFieldValue {
                field: "hours_per_day".to_string(),
                reason: format!(
                    "{} is outside 0 ..= {}",
                    entry.hours_per_day, MAX_HOURS_PER_DAY
                ),
            });
        }
        if !seen.insert(entry.week_day) {
            return Err(ValidationError::ConstraintViolation(format!(
                "week_day {} appears more than once",
                entry.week_day
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(week_day: i16, hours_per_day: i16) -> AvailabilityEntry {
        AvailabilityEntry {
            week_day,
            hours_per_day,
        }
    }

    #[test]
    fn test_hours_convert_to_minutes() {
        let profile =
            AvailabilityProfile::from_entries(Uuid::new_v4(), &[entry(1, 2), entry(3, 24)])
                .unwrap();
        assert_eq!(profile.minutes_for_weekday(1), 120);
        assert_eq!(profile.minutes_for_weekday(3), 1440);
        assert_eq!(profile.weekly_minutes(), 1560);
    }

    #[test]
    fn test_missing_weekdays_are_closed() {
        let profile = AvailabilityProfile::from_entries(Uuid::new_v4(), &[entry(5, 1)]).unwrap();
        for day in [0, 1, 2, 3, 4, 6] {
            assert_eq!(profile.minutes_for_weekday(day), 0);
        }
    }

    #[test]
    fn test_empty_profile_is_rejected() {
        let learner_id = Uuid::new_v4();
        let err = AvailabilityProfile::from_entries(learner_id, &[]).unwrap_err();
        assert!(matches!(
            err,
            PlanError::NoAvailabilityConfigured { learner_id: id } if id == learner_id
        ));
    }

    #[test]
    fn test_all_zero_profile_is_rejected() {
        let entries: Vec<_> = (0..7).map(|day| entry(day, 0)).collect();
        let result = AvailabilityProfile::from_entries(Uuid::new_v4(), &entries);
        assert!(matches!(
            result,
            Err(PlanError::NoAvailabilityConfigured { .. })
        ));
    }

    #[test]
    fn test_minutes_on_uses_sunday_based_weekday() {
        let profile = AvailabilityProfile::from_minutes([10, 20, 30, 40, 50, 60, 70]);
        // 2026-10-18 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(profile.minutes_on(sunday), 10);
        assert_eq!(profile.minutes_on(sunday.succ_opt().unwrap()), 20);
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        assert!(validate_entries(&[entry(7, 1)]).is_err());
        assert!(validate_entries(&[entry(-1, 1)]).is_err());
        assert!(validate_entries(&[entry(2, 25)]).is_err());
        assert!(validate_entries(&[entry(2, -1)]).is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_weekday() {
        let result = validate_entries(&[entry(2, 1), entry(2, 3)]);
        assert!(matches!(
            result,
            Err(ValidationError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_validate_accepts_full_week() {
        let entries: Vec<_> = (0..7).map(|day| entry(day, 2)).collect();
        assert!(validate_entries(&entries).is_ok());
        assert!(validate_entries(&[]).is_ok());
    }

    #[test]
    fn test_out_of_range_weekday_reads_as_closed() {
        let profile = AvailabilityProfile::from_minutes([60; 7]);
        assert_eq!(profile.minutes_for_weekday(7), 0);
        assert_eq!(profile.minutes_for_weekday(usize::MAX), 0);
    }
}
