//! Keystroke capture adapter.
//!
//! Event-driven counterpart to the frame-scan adapter: it suspends until the
//! external peripheral submits a line of text, emits one scan event per
//! submission, and re-asserts input focus after every submission and after
//! any focus loss, since the peripheral assumes a focused field.
//!
//! A submitted line that looks like a structured payload goes through the
//! codec. A bare identifier is normalized (trim, ASCII uppercase) and either
//! wrapped into a synthetic token carrying the active session's course and a
//! `DEVICE-` nonce (when the adapter was bound at activation), or emitted as
//! a raw identifier scan for the pipeline to complete.

use crate::devices::AnyKeystrokePeripheral;
use crate::events::{AdapterKind, CaptureEvent, ScanEvent};
use crate::feed::ScanFeed;
use crate::traits::{KeystrokeInput, KeystrokePeripheral};
use attend_core::Nonce;
use attend_token::AttendanceToken;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default capacity of the event channel between adapter task and consumer.
const CHANNEL_CAPACITY: usize = 32;

/// Course binding for synthetic tokens.
///
/// Raw peripheral input carries no course of its own; bound adapters stamp
/// submissions with the active session's course so the validation pipeline
/// sees a complete token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBinding {
    /// Course the active session is bound to.
    pub course_id: String,

    /// Display name of that course.
    pub course_name: String,
}

impl SessionBinding {
    /// Create a new binding.
    pub fn new(course_id: impl Into<String>, course_name: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            course_name: course_name.into(),
        }
    }
}

/// Activate the keystroke adapter on a peripheral.
///
/// Spawns the event loop task and returns the feed handle. With a
/// [`SessionBinding`], bare identifiers become synthetic [`ScanEvent::TokenScan`]
/// events; without one they are emitted as [`ScanEvent::RawIdentifierScan`].
///
/// # Examples
///
/// ```no_run
/// use attend_capture::devices::AnyKeystrokePeripheral;
/// use attend_capture::keystroke::{self, SessionBinding};
/// use attend_capture::mock::MockWedge;
///
/// # async fn example() {
/// let (wedge, handle) = MockWedge::new();
/// let mut feed = keystroke::activate(
///     AnyKeystrokePeripheral::Mock(wedge),
///     Some(SessionBinding::new("CS-404", "Network Security")),
/// );
///
/// handle.type_line(" s1 ").await.unwrap();
/// let event = feed.recv().await; // synthetic token for subject "S1"
///
/// feed.stop().await;
/// # }
/// ```
pub fn activate(
    peripheral: AnyKeystrokePeripheral,
    binding: Option<SessionBinding>,
) -> ScanFeed {
    let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();
    let active = Arc::new(AtomicBool::new(true));

    let task = tokio::spawn(run(
        peripheral,
        binding,
        event_tx,
        cancel.clone(),
        Arc::clone(&active),
    ));

    ScanFeed::new(event_rx, cancel, task, active)
}

async fn run(
    mut peripheral: AnyKeystrokePeripheral,
    binding: Option<SessionBinding>,
    tx: mpsc::Sender<CaptureEvent>,
    cancel: CancellationToken,
    active: Arc<AtomicBool>,
) {
    // The peripheral types into whatever holds focus; grab it before the
    // first submission can arrive.
    refocus(&mut peripheral).await;

    loop {
        let input = tokio::select! {
            _ = cancel.cancelled() => break,
            input = peripheral.read_input() => input,
        };

        match input {
            Ok(KeystrokeInput::Line(line)) => {
                if let Some(event) = event_for_line(&line, binding.as_ref())
                    && tx.send(event).await.is_err()
                {
                    break; // consumer gone
                }
                refocus(&mut peripheral).await;
            }
            Ok(KeystrokeInput::FocusLost) => {
                debug!("peripheral target lost focus, re-asserting");
                refocus(&mut peripheral).await;
            }
            Err(e) => {
                let _ = tx
                    .send(CaptureEvent::Fault {
                        adapter: AdapterKind::Keystroke,
                        error: e.to_string(),
                    })
                    .await;
                break;
            }
        }
    }

    active.store(false, Ordering::Release);
    debug!("keystroke adapter deactivated");
}

/// Map one submitted line to a capture event, or `None` for silence.
fn event_for_line(line: &str, binding: Option<&SessionBinding>) -> Option<CaptureEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // Structured payloads (a phone pasting its token through the wedge) go
    // through the codec like a camera detection would.
    if line.starts_with('{') {
        return Some(match attend_token::decode(line) {
            Ok(token) => CaptureEvent::scan_now(ScanEvent::TokenScan { token }),
            Err(error) => CaptureEvent::Malformed { error },
        });
    }

    let subject_id = line.to_uppercase();
    let received_at = Utc::now();

    let event = match binding {
        Some(binding) => ScanEvent::TokenScan {
            token: AttendanceToken {
                subject_id,
                subject_name: None,
                course_id: binding.course_id.clone(),
                course_name: binding.course_name.clone(),
                issued_at: received_at.timestamp_millis(),
                nonce: Nonce::device(received_at).as_str().to_string(),
            },
        },
        None => ScanEvent::RawIdentifierScan { subject_id },
    };

    Some(CaptureEvent::Scan { event, received_at })
}

async fn refocus(peripheral: &mut AnyKeystrokePeripheral) {
    if let Err(e) = peripheral.focus().await {
        warn!(error = %e, "failed to re-assert peripheral focus");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockWedge;
    use attend_token::DecodeError;

    #[tokio::test]
    async fn test_bare_identifier_is_normalized() {
        let (wedge, handle) = MockWedge::new();
        let mut feed = activate(
            AnyKeystrokePeripheral::Mock(wedge),
            Some(SessionBinding::new("CS-404", "Network Security")),
        );

        handle.type_line("  s1 ").await.unwrap();

        match feed.recv().await.unwrap() {
            CaptureEvent::Scan {
                event: ScanEvent::TokenScan { token },
                ..
            } => {
                assert_eq!(token.subject_id, "S1");
                assert_eq!(token.course_id, "CS-404");
                assert!(token.nonce.starts_with("DEVICE-"));
            }
            other => panic!("Expected synthetic token scan, got {other:?}"),
        }

        feed.stop().await;
    }

    #[tokio::test]
    async fn test_unbound_adapter_emits_raw_identifier() {
        let (wedge, handle) = MockWedge::new();
        let mut feed = activate(AnyKeystrokePeripheral::Mock(wedge), None);

        handle.type_line("badge-7").await.unwrap();

        match feed.recv().await.unwrap() {
            CaptureEvent::Scan {
                event: ScanEvent::RawIdentifierScan { subject_id },
                ..
            } => assert_eq!(subject_id, "BADGE-7"),
            other => panic!("Expected raw identifier scan, got {other:?}"),
        }

        feed.stop().await;
    }

    #[tokio::test]
    async fn test_empty_submission_is_silent() {
        let (wedge, handle) = MockWedge::new();
        let mut feed = activate(AnyKeystrokePeripheral::Mock(wedge), None);

        handle.type_line("   ").await.unwrap();
        handle.type_line("s2").await.unwrap();

        match feed.recv().await.unwrap() {
            CaptureEvent::Scan {
                event: ScanEvent::RawIdentifierScan { subject_id },
                ..
            } => assert_eq!(subject_id, "S2"),
            other => panic!("Expected S2, got {other:?}"),
        }

        feed.stop().await;
    }

    #[tokio::test]
    async fn test_structured_line_goes_through_codec() {
        let (wedge, handle) = MockWedge::new();
        let mut feed = activate(AnyKeystrokePeripheral::Mock(wedge), None);

        handle
            .type_line(r#"{"subjectId":"S1","courseId":"CS-404","nonce":"n1"}"#)
            .await
            .unwrap();
        handle.type_line(r#"{"subjectId":"S1"}"#).await.unwrap();

        match feed.recv().await.unwrap() {
            CaptureEvent::Scan {
                event: ScanEvent::TokenScan { token },
                ..
            } => assert_eq!(token.nonce, "n1"),
            other => panic!("Expected token scan, got {other:?}"),
        }

        match feed.recv().await.unwrap() {
            CaptureEvent::Malformed {
                error: DecodeError::MissingField(field),
            } => assert_eq!(field, "courseId"),
            other => panic!("Expected malformed event, got {other:?}"),
        }

        feed.stop().await;
    }

    #[tokio::test]
    async fn test_refocus_after_submission_and_focus_loss() {
        let (wedge, handle) = MockWedge::new();
        let mut feed = activate(AnyKeystrokePeripheral::Mock(wedge), None);

        // Activation focuses once.
        handle.type_line("s1").await.unwrap();
        let _ = feed.recv().await.unwrap();

        handle.lose_focus().await.unwrap();
        handle.type_line("s2").await.unwrap();
        let _ = feed.recv().await.unwrap();

        // activation + after s1 + after focus loss + after s2
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(handle.focus_count(), 4);

        feed.stop().await;
    }

    #[tokio::test]
    async fn test_disconnect_faults_and_deactivates() {
        let (wedge, handle) = MockWedge::new();
        let mut feed = activate(AnyKeystrokePeripheral::Mock(wedge), None);

        drop(handle); // channel closed: peripheral disconnected

        match feed.recv().await.unwrap() {
            CaptureEvent::Fault {
                adapter: AdapterKind::Keystroke,
                ..
            } => {}
            other => panic!("Expected fault, got {other:?}"),
        }

        assert!(feed.recv().await.is_none());
        assert!(!feed.is_active());
    }

    #[tokio::test]
    async fn test_device_nonces_differ_across_taps() {
        let (wedge, handle) = MockWedge::new();
        let mut feed = activate(
            AnyKeystrokePeripheral::Mock(wedge),
            Some(SessionBinding::new("CS-404", "Network Security")),
        );

        handle.type_line("s1").await.unwrap();
        let first = feed.recv().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        handle.type_line("s1").await.unwrap();
        let second = feed.recv().await.unwrap();

        let nonce_of = |e: &CaptureEvent| match e {
            CaptureEvent::Scan {
                event: ScanEvent::TokenScan { token },
                ..
            } => token.nonce.clone(),
            other => panic!("Expected token scan, got {other:?}"),
        };

        assert_ne!(nonce_of(&first), nonce_of(&second));

        feed.stop().await;
    }
}
