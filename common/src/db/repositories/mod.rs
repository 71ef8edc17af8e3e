// Repository layer for database operations

pub mod availability;
pub mod course;
pub mod work_item;

pub use availability::AvailabilityRepository;
pub use course::CourseRepository;
pub use work_item::WorkItemRepository;
