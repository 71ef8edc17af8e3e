// Study schedule planning: availability profiles, work queues, greedy
// distribution and the recalculation policy that drives it

pub mod distribution;
pub mod policy;
pub mod profile;
pub mod queue;
pub mod service;
pub mod store;

pub use distribution::{distribute, distribute_within, Assignment, DistributionPlan, MAX_DAYS};
pub use policy::{PlanRun, PlanTrigger, ReschedulePolicy};
pub use profile::{validate_entries, AvailabilityProfile};
pub use queue::{QueuedItem, WorkQueue};
pub use service::{PlannerService, ScheduleOutcome};
pub use store::{AvailabilityStore, WorkItemStore};
