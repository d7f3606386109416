//! The validation pipeline's pure decision function.
//!
//! `decide` evaluates one scan event against the active session and ledger
//! and returns the first matching decision. The evaluation order matters
//! for user-facing messaging; replay-before-duplicate is additionally
//! load-bearing: a replayed nonce must never be reported as a fresh
//! duplicate. Committing the decision (ledger mutation, durable write) is
//! the session controller's job; nothing in this module mutates state.

use crate::ledger::{AttendanceRecord, Ledger};
use crate::messages::StatusMessages;
use crate::session::Session;
use attend_capture::ScanEvent;
use attend_core::{Nonce, SubjectId};
use chrono::{DateTime, Utc};

/// Outcome of evaluating one scan event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The scan was accepted and this record is to be committed.
    Accepted(AttendanceRecord),

    /// Token fields missing or unusable (shape check failed).
    RejectedMalformed,

    /// The token's nonce was already consumed this session.
    RejectedReplay,

    /// The token was issued for a different course.
    RejectedWrongCourse,

    /// The subject already holds a mark in this session.
    RejectedDuplicate,

    /// The durable write failed after the local commit; the subject is
    /// still considered present for the rest of the session.
    RejectedPersistenceFailure,
}

impl Decision {
    /// Returns `true` for `Accepted`.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The transient status message to show for this decision.
    #[must_use]
    pub fn status_message(&self) -> String {
        match self {
            Self::Accepted(record) => StatusMessages::marked_present(record.display_label()),
            Self::RejectedMalformed => StatusMessages::MALFORMED.to_string(),
            Self::RejectedReplay => StatusMessages::REPLAY.to_string(),
            Self::RejectedWrongCourse => StatusMessages::WRONG_COURSE.to_string(),
            Self::RejectedDuplicate => StatusMessages::DUPLICATE.to_string(),
            Self::RejectedPersistenceFailure => StatusMessages::PERSISTENCE.to_string(),
        }
    }
}

/// The nonce a scan event consumes on acceptance.
///
/// Producer tokens carry their own; raw identifiers get a device nonce
/// keyed by the event's arrival instant. Returns `None` when the event has
/// no usable nonce (which `decide` reports as malformed).
#[must_use]
pub fn consumed_nonce(event: &ScanEvent, received_at: DateTime<Utc>) -> Option<Nonce> {
    match event {
        ScanEvent::TokenScan { token } => Nonce::new(&token.nonce).ok(),
        ScanEvent::RawIdentifierScan { .. } => Some(Nonce::device(received_at)),
    }
}

/// Evaluate one scan event. First match wins.
///
/// 1. Shape check → `RejectedMalformed`
/// 2. Nonce membership → `RejectedReplay`
/// 3. Course match → `RejectedWrongCourse`
/// 4. Duplicate subject → `RejectedDuplicate`
/// 5. Otherwise `Accepted` with the record to commit
///
/// Raw identifier scans skip the course check: device input is implicitly
/// bound to the active session.
#[must_use]
pub fn decide(
    event: &ScanEvent,
    received_at: DateTime<Utc>,
    session: &Session,
    ledger: &Ledger,
) -> Decision {
    // 1. Shape: a usable subject, nonce, and course binding, or nothing
    // else applies.
    let Ok(subject_id) = SubjectId::new(event.subject_id()) else {
        return Decision::RejectedMalformed;
    };
    let Some(nonce) = consumed_nonce(event, received_at) else {
        return Decision::RejectedMalformed;
    };
    if let ScanEvent::TokenScan { token } = event
        && token.course_id.trim().is_empty()
    {
        return Decision::RejectedMalformed;
    }

    // 2. Replay, before the duplicate check: retransmission of an already
    // accepted token must read as "already scanned", not as a second person.
    if ledger.contains_nonce(&nonce) {
        return Decision::RejectedReplay;
    }

    // 3. Course binding (producer tokens only).
    if let ScanEvent::TokenScan { token } = event
        && token.course_id != session.course_id.as_str()
    {
        return Decision::RejectedWrongCourse;
    }

    // 4. One mark per person per session, independent of the nonce check.
    if ledger.contains_subject(&subject_id) {
        return Decision::RejectedDuplicate;
    }

    let subject_name = match event {
        ScanEvent::TokenScan { token } => token.subject_name.clone(),
        ScanEvent::RawIdentifierScan { .. } => None,
    };

    Decision::Accepted(AttendanceRecord::new(subject_id, subject_name, received_at))
}
