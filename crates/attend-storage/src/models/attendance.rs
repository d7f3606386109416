use crate::error::{StorageError, StorageResult};
use attend_core::SubjectId;
use attend_engine::AttendanceRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row in the `attendance_logs` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct AttendanceRow {
    /// Auto-increment primary key.
    pub id: i64,

    /// Owning session.
    pub session_id: String,

    /// Normalized subject identifier.
    pub subject_id: String,

    /// Optional subject display name.
    pub subject_name: Option<String>,

    /// Consumed nonce (unique per session).
    pub nonce: String,

    /// When the mark was accepted.
    pub recorded_at: DateTime<Utc>,
}

impl AttendanceRow {
    /// Convert the row into an engine record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` when the stored subject
    /// identifier no longer passes validation.
    pub fn into_record(self) -> StorageResult<AttendanceRecord> {
        Ok(AttendanceRecord {
            subject_id: SubjectId::new(&self.subject_id)
                .map_err(|e| StorageError::Validation(e.to_string()))?,
            subject_name: self.subject_name,
            recorded_at: self.recorded_at,
        })
    }
}

/// Insert payload for one attendance mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    /// Owning session.
    pub session_id: String,

    /// Normalized subject identifier.
    pub subject_id: String,

    /// Optional subject display name.
    pub subject_name: Option<String>,

    /// Consumed nonce.
    pub nonce: String,

    /// When the mark was accepted.
    pub recorded_at: DateTime<Utc>,
}

impl NewAttendance {
    /// Build an insert payload from an engine record.
    #[must_use]
    pub fn from_record(
        session_id: &str,
        record: &AttendanceRecord,
        nonce: &str,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            subject_id: record.subject_id.as_str().to_string(),
            subject_name: record.subject_name.clone(),
            nonce: nonce.to_string(),
            recorded_at: record.recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_into_record() {
        let row = AttendanceRow {
            id: 1,
            session_id: "CS-404-abc".to_string(),
            subject_id: "S1".to_string(),
            subject_name: Some("Ada".to_string()),
            nonce: "n1".to_string(),
            recorded_at: Utc::now(),
        };

        let record = row.into_record().unwrap();
        assert_eq!(record.subject_id.as_str(), "S1");
        assert_eq!(record.subject_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_new_attendance_from_record() {
        let record = AttendanceRecord::new(SubjectId::new("S1").unwrap(), None, Utc::now());
        let new = NewAttendance::from_record("CS-404-abc", &record, "n1");

        assert_eq!(new.session_id, "CS-404-abc");
        assert_eq!(new.subject_id, "S1");
        assert_eq!(new.nonce, "n1");
    }
}
