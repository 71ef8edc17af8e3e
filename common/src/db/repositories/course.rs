// Course repository: catalog authoring and enrollment

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{Course, CourseOutline, NewCourse, Subject, SubjectOutline, Topic};
use chrono::Utc;
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

/// Repository for courses, subjects, topics and enrollments
#[derive(Clone)]
pub struct CourseRepository {
    pool: DbPool,
}

impl CourseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a course with its subjects and topics in one transaction
    ///
    /// Topic order indexes run across all subjects in submission order.
    #[instrument(skip(self, new_course), fields(title = %new_course.title))]
    pub async fn create(&self, new_course: &NewCourse) -> Result<CourseOutline, DatabaseError> {
        let course = Course {
            id: Uuid::new_v4(),
            title: new_course.title.clone(),
            description: new_course.description.clone(),
            created_at: Utc::now(),
        };

        let mut subjects: Vec<SubjectOutline> = new_course
            .subjects
            .iter()
            .map(|s| SubjectOutline {
                subject: Subject {
                    id: Uuid::new_v4(),
                    course_id: course.id,
                    name: s.name.clone(),
                    color: s.color.clone(),
                    weight: s.weight,
                },
                topics: Vec::with_capacity(s.topics.len()),
            })
            .collect();

        for (subject_pos, order_index, topic) in new_course.ordered_topics() {
            let subject = &mut subjects[subject_pos];
            subject.topics.push(Topic {
                id: Uuid::new_v4(),
                subject_id: subject.subject.id,
                name: topic.name.clone(),
                estimated_minutes: topic.estimated_minutes,
                order_index,
            });
        }

        let mut tx = self
            .pool
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO courses (id, title, description, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(course.id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, outline) in subjects.iter().enumerate() {
            let subject = &outline.subject;
            sqlx::query(
                r#"
                INSERT INTO subjects (id, course_id, name, color, weight, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(subject.id)
            .bind(subject.course_id)
            .bind(&subject.name)
            .bind(&subject.color)
            .bind(subject.weight)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;

            for topic in &outline.topics {
                sqlx::query(
                    r#"
                    INSERT INTO topics (id, subject_id, name, estimated_minutes, order_index)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(topic.id)
                .bind(topic.subject_id)
                .bind(&topic.name)
                .bind(topic.estimated_minutes)
                .bind(topic.order_index)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tracing::info!(course_id = %course.id, subjects = subjects.len(), "Course created");
        Ok(CourseOutline { course, subjects })
    }

    /// Load a course with subjects and topics in study order
    #[instrument(skip(self))]
    pub async fn find_outline(&self, course_id: Uuid) -> Result<Option<CourseOutline>, DatabaseError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(self.pool.pool())
        .await?;

        let Some(course) = course else {
            return Ok(None);
        };

        let subjects = sqlx::query_as::<_, Subject>(
            r#"
            SELECT id, course_id, name, color, weight
            FROM subjects
            WHERE course_id = $1
            ORDER BY position
            "#,
        )
        .bind(course_id)
        .fetch_all(self.pool.pool())
        .await?;

        let topics = sqlx::query_as::<_, Topic>(
            r#"
            SELECT t.id, t.subject_id, t.name, t.estimated_minutes, t.order_index
            FROM topics t
            JOIN subjects s ON s.id = t.subject_id
            WHERE s.course_id = $1
            ORDER BY t.order_index
            "#,
        )
        .bind(course_id)
        .fetch_all(self.pool.pool())
        .await?;

        let subjects = subjects
            .into_iter()
            .map(|subject| {
                let topics = topics
                    .iter()
                    .filter(|t| t.subject_id == subject.id)
                    .cloned()
                    .collect();
                SubjectOutline { subject, topics }
            })
            .collect();

        Ok(Some(CourseOutline { course, subjects }))
    }

    /// Enroll a learner and create one pending work item per course topic
    ///
    /// Returns the number of work items created. Items are inserted in
    /// study order so their creation sequence follows the topic order.
    #[instrument(skip(self))]
    pub async fn enroll(&self, learner_id: Uuid, course_id: Uuid) -> Result<u64, DatabaseError> {
        let mut tx = self
            .pool
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let exists: bool = sqlx::query("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
            .bind(course_id)
            .fetch_one(&mut *tx)
            .await?
            .try_get(0)?;
        if !exists {
            return Err(DatabaseError::NotFound(format!("Course {}", course_id)));
        }

        sqlx::query(
            r#"
            INSERT INTO enrollments (learner_id, course_id, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(learner_id)
        .bind(course_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let topic_ids: Vec<Uuid> = sqlx::query(
            r#"
            SELECT t.id
            FROM topics t
            JOIN subjects s ON s.id = t.subject_id
            WHERE s.course_id = $1
            ORDER BY t.order_index
            "#,
        )
        .bind(course_id)
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(|row| row.try_get("id"))
        .collect::<Result<_, _>>()?;

        for topic_id in &topic_ids {
            sqlx::query(
                r#"
                INSERT INTO work_items (id, learner_id, topic_id, course_id, status, created_at)
                VALUES ($1, $2, $3, $4, 'pending', $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(learner_id)
            .bind(topic_id)
            .bind(course_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tracing::info!(
            learner_id = %learner_id,
            course_id = %course_id,
            work_items = topic_ids.len(),
            "Learner enrolled"
        );
        Ok(topic_ids.len() as u64)
    }
}
