// Anchor and horizon selection for schedule runs

use crate::config::PlannerConfig;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// What asked for a schedule run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanTrigger {
    /// First distribution after availability setup
    Generate,
    /// Re-plan after the learner fell behind
    Recalculate,
}

impl std::fmt::Display for PlanTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanTrigger::Generate => write!(f, "generate"),
            PlanTrigger::Recalculate => write!(f, "recalculate"),
        }
    }
}

/// Parameters of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanRun {
    pub trigger: PlanTrigger,
    pub anchor: NaiveDate,
    pub max_days: u32,
}

/// Decides where a run starts and how far it may look ahead
///
/// Both triggers re-pack the learner's whole pending backlog from today,
/// including items that already hold a future date from an earlier run.
/// Running it twice against unchanged state therefore yields the same dates.
#[derive(Debug, Clone, Copy)]
pub struct ReschedulePolicy {
    timezone: Tz,
    max_days: u32,
}

impl ReschedulePolicy {
    pub fn new(timezone: Tz, max_days: u32) -> Self {
        Self { timezone, max_days }
    }

    pub fn from_config(config: &PlannerConfig) -> Result<Self, String> {
        Ok(Self::new(config.tz()?, config.max_days))
    }

    /// Calendar date of `now` in the planner timezone
    pub fn anchor_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    pub fn plan_run(&self, trigger: PlanTrigger, now: DateTime<Utc>) -> PlanRun {
        PlanRun {
            trigger,
            anchor: self.anchor_date(now),
            max_days: self.max_days,
        }
    }
}

impl Default for ReschedulePolicy {
    fn default() -> Self {
        Self::new(Tz::UTC, super::MAX_DAYS)
    }
}
