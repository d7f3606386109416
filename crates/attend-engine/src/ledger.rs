//! Session-scoped attendance ledger.
//!
//! Two structures scoped to one session: the set of consumed nonces (the
//! anti-replay basis) and the append-ordered list of accepted records. The
//! ledger is the single source of truth the validation pipeline consults
//! and mutates; it is never shared across sessions and is replaced
//! wholesale when a new session starts.

use attend_core::{Nonce, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One accepted attendance mark.
///
/// Created only by the validation pipeline on acceptance; immutable once
/// created. Lives in the ledger for the duration of the owning session and
/// is additionally persisted externally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Normalized subject identifier.
    pub subject_id: SubjectId,

    /// Optional subject display name.
    pub subject_name: Option<String>,

    /// When the mark was accepted.
    pub recorded_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Create a record at the given instant.
    #[must_use]
    pub fn new(
        subject_id: SubjectId,
        subject_name: Option<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id,
            subject_name,
            recorded_at,
        }
    }

    /// Display label: the subject's name when known, else the identifier.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.subject_name
            .as_deref()
            .unwrap_or_else(|| self.subject_id.as_str())
    }
}

/// In-memory, session-scoped record of accepted attendance and consumed
/// nonces.
///
/// # Examples
///
/// ```
/// use attend_core::{Nonce, SubjectId};
/// use attend_engine::{AttendanceRecord, Ledger};
/// use chrono::Utc;
///
/// let mut ledger = Ledger::new();
/// let nonce = Nonce::new("n1").unwrap();
/// let record = AttendanceRecord::new(SubjectId::new("S1").unwrap(), None, Utc::now());
///
/// assert!(!ledger.contains_nonce(&nonce));
/// ledger.commit(record, nonce.clone());
///
/// assert!(ledger.contains_nonce(&nonce));
/// assert_eq!(ledger.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Ledger {
    /// Consumed nonces; membership test is the replay check.
    nonces: HashSet<Nonce>,

    /// Accepted records in insertion order (preserved for export).
    records: Vec<AttendanceRecord>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the nonce has already been consumed this session.
    #[must_use]
    pub fn contains_nonce(&self, nonce: &Nonce) -> bool {
        self.nonces.contains(nonce)
    }

    /// Returns `true` if the subject already holds an attendance mark.
    ///
    /// Intentionally independent of the nonce check: a different token for
    /// an already-marked subject is still a duplicate.
    #[must_use]
    pub fn contains_subject(&self, subject_id: &SubjectId) -> bool {
        self.records.iter().any(|r| &r.subject_id == subject_id)
    }

    /// Insert an accepted record and consume its nonce.
    pub fn commit(&mut self, record: AttendanceRecord, nonce: Nonce) {
        debug_assert!(
            !self.contains_subject(&record.subject_id),
            "pipeline admits each subject at most once per session"
        );
        self.nonces.insert(nonce);
        self.records.push(record);
    }

    /// The running "present count".
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no record has been accepted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order (export order).
    #[must_use]
    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    /// Records most-recent-first (display order).
    pub fn recent(&self) -> impl Iterator<Item = &AttendanceRecord> {
        self.records.iter().rev()
    }

    /// Number of consumed nonces.
    #[must_use]
    pub fn consumed_nonce_count(&self) -> usize {
        self.nonces.len()
    }

    /// Clear the visible record list, keeping consumed nonces.
    ///
    /// Used when navigating back out of a capture view: the on-screen list
    /// resets, but replay protection for the session's lifetime must not.
    pub fn clear_records(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subject: &str) -> AttendanceRecord {
        AttendanceRecord::new(SubjectId::new(subject).unwrap(), None, Utc::now())
    }

    use chrono::Utc;

    #[test]
    fn test_commit_consumes_nonce_and_appends() {
        let mut ledger = Ledger::new();
        let nonce = Nonce::new("n1").unwrap();

        ledger.commit(record("S1"), nonce.clone());

        assert!(ledger.contains_nonce(&nonce));
        assert!(ledger.contains_subject(&SubjectId::new("S1").unwrap()));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.consumed_nonce_count(), 1);
    }

    #[test]
    fn test_record_order_insertion_vs_display() {
        let mut ledger = Ledger::new();
        ledger.commit(record("S1"), Nonce::new("n1").unwrap());
        ledger.commit(record("S2"), Nonce::new("n2").unwrap());
        ledger.commit(record("S3"), Nonce::new("n3").unwrap());

        let export: Vec<_> = ledger.records().iter().map(|r| r.subject_id.as_str()).collect();
        assert_eq!(export, ["S1", "S2", "S3"]);

        let display: Vec<_> = ledger.recent().map(|r| r.subject_id.as_str()).collect();
        assert_eq!(display, ["S3", "S2", "S1"]);
    }

    #[test]
    fn test_clear_records_keeps_nonces() {
        let mut ledger = Ledger::new();
        let nonce = Nonce::new("n1").unwrap();
        ledger.commit(record("S1"), nonce.clone());

        ledger.clear_records();

        assert!(ledger.is_empty());
        assert!(ledger.contains_nonce(&nonce));
        assert_eq!(ledger.consumed_nonce_count(), 1);
    }

    #[test]
    fn test_fresh_ledger_forgets_everything() {
        let mut ledger = Ledger::new();
        let nonce = Nonce::new("n1").unwrap();
        ledger.commit(record("S1"), nonce.clone());

        // Starting a new session replaces the ledger entirely.
        let ledger = Ledger::new();
        assert!(!ledger.contains_nonce(&nonce));
        assert!(!ledger.contains_subject(&SubjectId::new("S1").unwrap()));
    }

    #[test]
    fn test_display_label_prefers_name() {
        let named = AttendanceRecord::new(
            SubjectId::new("S1").unwrap(),
            Some("Ada Lovelace".to_string()),
            Utc::now(),
        );
        assert_eq!(named.display_label(), "Ada Lovelace");

        let anonymous = record("S2");
        assert_eq!(anonymous.display_label(), "S2");
    }
}
