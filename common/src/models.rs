use crate::errors::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Catalog Models
// ============================================================================

/// Course groups subjects a learner can enroll in
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Subject groups topics inside a course
///
/// `weight` is stored for catalog authors but distribution ignores it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub weight: i32,
}

/// Topic is an atomic unit of study content
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Topic {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub name: String,
    pub estimated_minutes: i32,
    /// Position in the course-wide study order
    pub order_index: i32,
}

/// Course together with its subjects and topics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseOutline {
    #[serde(flatten)]
    pub course: Course,
    pub subjects: Vec<SubjectOutline>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectOutline {
    #[serde(flatten)]
    pub subject: Subject,
    pub topics: Vec<Topic>,
}

/// Course submission with nested subjects and topics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
    pub subjects: Vec<NewSubject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub color: Option<String>,
    #[serde(default = "default_subject_weight")]
    pub weight: i32,
    pub topics: Vec<NewTopic>,
}

fn default_subject_weight() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTopic {
    pub name: String,
    pub estimated_minutes: i32,
}

impl NewCourse {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title".to_string()));
        }
        if self.subjects.is_empty() {
            return Err(ValidationError::MissingField("subjects".to_string()));
        }
        for subject in &self.subjects {
            if subject.name.trim().is_empty() {
                return Err(ValidationError::MissingField("subjects[].name".to_string()));
            }
            for topic in &subject.topics {
                if topic.name.trim().is_empty() {
                    return Err(ValidationError::MissingField(
                        "subjects[].topics[].name".to_string(),
                    ));
                }
                if topic.estimated_minutes <= 0 {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "estimated_minutes".to_string(),
                        reason: format!(
                            "topic '{}' must take at least one minute, got {}",
                            topic.name, topic.estimated_minutes
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Topics in course-wide study order with their running order index
    ///
    /// Subjects keep their submitted order and topics their order inside the
    /// subject, so the index is unique across the whole course.
    pub fn ordered_topics(&self) -> impl Iterator<Item = (usize, i32, &NewTopic)> + '_ {
        self.subjects
            .iter()
            .enumerate()
            .flat_map(|(subject_pos, subject)| {
                subject.topics.iter().map(move |topic| (subject_pos, topic))
            })
            .zip(0..)
            .map(|((subject_pos, topic), order_index)| (subject_pos, order_index, topic))
    }
}

// ============================================================================
// Learner Models
// ============================================================================

/// WorkItem is a learner's instance of a topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub topic_id: Uuid,
    pub status: WorkItemStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// WorkItemStatus tracks whether a learner finished a topic
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Pending,
    Done,
}

impl std::fmt::Display for WorkItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkItemStatus::Pending => write!(f, "pending"),
            WorkItemStatus::Done => write!(f, "done"),
        }
    }
}

impl FromStr for WorkItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WorkItemStatus::Pending),
            "done" => Ok(WorkItemStatus::Done),
            _ => Err(format!("Invalid work item status: {}", s)),
        }
    }
}

/// Work item joined with its topic and subject for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub item: WorkItem,
    pub topic_name: String,
    pub estimated_minutes: i32,
    pub order_index: i32,
    pub subject_name: String,
    pub subject_color: Option<String>,
}

/// AvailabilityEntry is a learner's study budget for one weekday
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityEntry {
    /// 0 = Sunday .. 6 = Saturday
    pub week_day: i16,
    pub hours_per_day: i16,
}
