//! Session and course reference data.

use attend_core::{CourseId, Result, SessionId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Static course catalog entry.
///
/// Read-only reference data; the engine never mutates it. Enrollment count
/// is display context for the "present / enrolled" counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Catalog identifier.
    pub course_id: CourseId,

    /// Course display name.
    pub name: String,

    /// Short course description.
    pub description: String,

    /// Number of enrolled students.
    pub enrollment_count: u32,
}

impl Course {
    /// Create a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the course identifier is invalid.
    pub fn new(
        course_id: &str,
        name: impl Into<String>,
        description: impl Into<String>,
        enrollment_count: u32,
    ) -> Result<Self> {
        Ok(Self {
            course_id: CourseId::new(course_id)?,
            name: name.into(),
            description: description.into(),
            enrollment_count,
        })
    }
}

/// The built-in course catalog the deployment ships with.
#[must_use]
pub fn default_catalog() -> Vec<Course> {
    [
        ("CS-404", "Network Security", "Protocol Analysis", 42),
        ("CS-302", "Algorithms II", "Data Structures", 82),
        ("ETH-101", "Cyber Ethics", "Legal Frameworks", 35),
        ("CS-402", "Kernel Arch", "System Design", 18),
        ("CS-309", "Intro to AI", "Machine Learning Basics", 25),
        ("CS-410", "Cloud Security", "Securing Cloud Infrastructures", 30),
        ("CS-305", "Database Systems", "SQL & NoSQL Databases", 40),
        ("CS-315", "Web Dev", "Full Stack Development", 38),
    ]
    .into_iter()
    .map(|(id, name, desc, count)| {
        Course::new(id, name, desc, count).expect("catalog identifiers are valid")
    })
    .collect()
}

/// One teaching session a lecturer runs attendance capture for.
///
/// Its `session_id` scopes the ledger and all anti-replay state; starting a
/// new session discards the previous ledger entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Identifier scoping the ledger and durable records.
    pub session_id: SessionId,

    /// Course this session is bound to.
    pub course_id: CourseId,

    /// Session display name ("Lecture: Network Security").
    pub name: String,

    /// Free-form description.
    pub description: String,

    /// Calendar date of the session.
    pub date: NaiveDate,

    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Begin a new session for a course at the given instant.
    #[must_use]
    pub fn begin(
        course: &Course,
        name: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: SessionId::generate(&course.course_id, at),
            course_id: course.course_id.clone(),
            name: name.into(),
            description: description.into(),
            date,
            created_at: at,
        }
    }
}
