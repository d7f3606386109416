//! Normalized capture events.
//!
//! Both adapters reduce their raw input to one event stream. A successfully
//! decoded payload becomes a [`ScanEvent`]; a detected-but-undecodable
//! payload is reported as `Malformed` (a rejected scan, not silence); an
//! adapter-level failure is reported once as `Fault`.

use attend_token::{AttendanceToken, DecodeError};
use chrono::{DateTime, Utc};
use std::fmt;

/// Normalized capture result, independent of which adapter produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A structured token, decoded from a frame or a peripheral line, or
    /// synthesized for raw device input bound to the active session.
    TokenScan {
        /// The decoded or synthesized token.
        token: AttendanceToken,
    },

    /// Keystroke-adapter shorthand when no structured token is available.
    ///
    /// The identifier is already normalized (trimmed, ASCII uppercase); the
    /// validation pipeline synthesizes the anti-replay nonce from the
    /// event's arrival instant.
    RawIdentifierScan {
        /// Normalized subject identifier.
        subject_id: String,
    },
}

impl ScanEvent {
    /// The subject identifier asserted by this event.
    pub fn subject_id(&self) -> &str {
        match self {
            Self::TokenScan { token } => &token.subject_id,
            Self::RawIdentifierScan { subject_id } => subject_id,
        }
    }
}

/// Which adapter produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Continuous camera-frame decoding.
    FrameScan,

    /// Discrete external-peripheral keystroke events.
    Keystroke,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameScan => write!(f, "FrameScan"),
            Self::Keystroke => write!(f, "Keystroke"),
        }
    }
}

/// Event delivered through a [`ScanFeed`](crate::feed::ScanFeed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A normalized scan with its arrival instant.
    Scan {
        /// The normalized scan event.
        event: ScanEvent,

        /// When the adapter produced the event. Device nonces are keyed by
        /// this instant.
        received_at: DateTime<Utc>,
    },

    /// A payload was detected but could not be decoded.
    Malformed {
        /// The decode failure.
        error: DecodeError,
    },

    /// The adapter hit a failure it cannot recover from silently.
    ///
    /// Reported once; the adapter task terminates (frame-scan acquisition
    /// failure) or keeps running where the fault is advisory.
    Fault {
        /// The adapter that failed.
        adapter: AdapterKind,

        /// Human-readable failure description.
        error: String,
    },
}

impl CaptureEvent {
    /// Wrap a scan event with the current arrival timestamp.
    pub fn scan_now(event: ScanEvent) -> Self {
        Self::Scan {
            event,
            received_at: Utc::now(),
        }
    }
}
