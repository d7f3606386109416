use crate::error::{StorageError, StorageResult};
use attend_core::{CourseId, SessionId};
use attend_engine::Session;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Row in the `sessions` table.
///
/// Identifiers are stored as plain text; conversion back into the engine's
/// validated types happens in [`SessionRow::into_session`], so a corrupted
/// row surfaces as a validation error instead of a panic.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct SessionRow {
    /// Session identifier (primary key).
    pub session_id: String,

    /// Course the session was run for.
    pub course_id: String,

    /// Session display name.
    pub name: String,

    /// Free-form description.
    pub description: String,

    /// Calendar date of the session.
    pub date: NaiveDate,

    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl SessionRow {
    /// Build a row from an engine session.
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.session_id.as_str().to_string(),
            course_id: session.course_id.as_str().to_string(),
            name: session.name.clone(),
            description: session.description.clone(),
            date: session.date,
            created_at: session.created_at,
        }
    }

    /// Convert the row back into an engine session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` when stored identifiers no longer
    /// pass the engine's validation rules.
    pub fn into_session(self) -> StorageResult<Session> {
        Ok(Session {
            session_id: SessionId::new(&self.session_id)
                .map_err(|e| StorageError::Validation(e.to_string()))?,
            course_id: CourseId::new(&self.course_id)
                .map_err(|e| StorageError::Validation(e.to_string()))?,
            name: self.name,
            description: self.description,
            date: self.date,
            created_at: self.created_at,
        })
    }
}
