//! Frame-scan capture adapter.
//!
//! Acquires a video stream and runs a cooperative per-frame poll loop: each
//! tick checks the cancellation token, stream liveness, and the next frame.
//! A lost stream triggers silent bounded-delay restart attempts until
//! recovery or shutdown; a frame without a symbol is silence; a detected
//! payload goes through the codec and is emitted as a scan or a malformed
//! event. A global cooldown absorbs decode bursts from a single physical
//! presentation.

use crate::devices::AnyFrameSource;
use crate::events::{AdapterKind, CaptureEvent, ScanEvent};
use crate::feed::ScanFeed;
use crate::traits::FrameSource;
use attend_core::constants::{FRAME_POLL_INTERVAL, SCAN_COOLDOWN, STREAM_RESTART_DELAY};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for the frame-scan adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameScanConfig {
    /// Poll loop cadence (display-refresh order of magnitude).
    pub poll_interval: Duration,

    /// Global detection cooldown; detections inside the window are dropped
    /// unconditionally, independent of nonce.
    pub cooldown: Duration,

    /// Delay before a restart attempt after the stream is lost.
    pub restart_delay: Duration,

    /// Capacity of the event channel between adapter task and consumer.
    pub channel_capacity: usize,
}

impl Default for FrameScanConfig {
    fn default() -> Self {
        Self {
            poll_interval: FRAME_POLL_INTERVAL,
            cooldown: SCAN_COOLDOWN,
            restart_delay: STREAM_RESTART_DELAY,
            channel_capacity: 32,
        }
    }
}

/// Activate the frame-scan adapter on a video source.
///
/// Spawns the poll-loop task and returns the feed handle. Acquisition
/// happens inside the task: one failed attempt gets one bounded automatic
/// retry, then the failure is reported once as a [`CaptureEvent::Fault`] and
/// the adapter deactivates without further retries. Stream loss *after* a
/// successful acquisition is a distinct path: it restarts silently until
/// recovery or shutdown.
///
/// # Examples
///
/// ```no_run
/// use attend_capture::devices::AnyFrameSource;
/// use attend_capture::frame_scan::{self, FrameScanConfig};
/// use attend_capture::mock::MockCamera;
///
/// # async fn example() {
/// let (camera, handle) = MockCamera::new();
/// let mut feed = frame_scan::activate(
///     AnyFrameSource::Mock(camera),
///     FrameScanConfig::default(),
/// );
///
/// handle.present_payload(r#"{"subjectId":"S1","courseId":"CS-404","nonce":"n1"}"#);
/// let event = feed.recv().await;
///
/// feed.stop().await; // stream released before this returns
/// # }
/// ```
pub fn activate(source: AnyFrameSource, config: FrameScanConfig) -> ScanFeed {
    let (event_tx, event_rx) = mpsc::channel(config.channel_capacity.max(1));
    let cancel = CancellationToken::new();
    let active = Arc::new(AtomicBool::new(true));

    let task = tokio::spawn(run(
        source,
        event_tx,
        cancel.clone(),
        Arc::clone(&active),
        config,
    ));

    ScanFeed::new(event_rx, cancel, task, active)
}

async fn run(
    mut source: AnyFrameSource,
    tx: mpsc::Sender<CaptureEvent>,
    cancel: CancellationToken,
    active: Arc<AtomicBool>,
    config: FrameScanConfig,
) {
    if acquire_with_retry(&mut source, &tx, &cancel, &config).await {
        poll_loop(&mut source, &tx, &cancel, &config).await;
    }

    // Single release point for every exit path: cancellation, channel
    // closure, and acquisition failure all pass through here.
    source.release().await;
    active.store(false, Ordering::Release);
    debug!("frame-scan adapter released its source");
}

/// Acquire the stream, retrying once after a bounded delay.
///
/// Returns `false` when acquisition ultimately failed or the adapter was
/// cancelled while waiting; the failure has then already been reported.
async fn acquire_with_retry(
    source: &mut AnyFrameSource,
    tx: &mpsc::Sender<CaptureEvent>,
    cancel: &CancellationToken,
    config: &FrameScanConfig,
) -> bool {
    match source.acquire().await {
        Ok(()) => return true,
        Err(e) => {
            warn!(error = %e, "stream acquisition failed, retrying once");
            source.release().await;
        }
    }

    if wait_or_cancelled(cancel, config.restart_delay).await {
        return false;
    }

    match source.acquire().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "stream acquisition failed, giving up");
            source.release().await;
            let _ = tx
                .send(CaptureEvent::Fault {
                    adapter: AdapterKind::FrameScan,
                    error: e.to_string(),
                })
                .await;
            false
        }
    }
}

async fn poll_loop(
    source: &mut AnyFrameSource,
    tx: &mpsc::Sender<CaptureEvent>,
    cancel: &CancellationToken,
    config: &FrameScanConfig,
) {
    let mut last_detection: Option<Instant> = None;

    loop {
        if wait_or_cancelled(cancel, config.poll_interval).await {
            return;
        }

        if !source.is_alive() {
            // Stream lost after acquisition: restart silently after a
            // bounded delay, until recovery or shutdown. No event is
            // emitted on this path.
            debug!("stream lost, scheduling restart");
            source.release().await;
            if wait_or_cancelled(cancel, config.restart_delay).await {
                return;
            }
            if let Err(e) = source.acquire().await {
                debug!(error = %e, "stream restart attempt failed");
                source.release().await;
            }
            continue;
        }

        let payload = match source.poll_symbol().await {
            Ok(Some(payload)) => payload,
            Ok(None) => continue,
            Err(e) if e.is_recoverable() => continue, // liveness check picks it up next tick
            Err(e) => {
                let _ = tx
                    .send(CaptureEvent::Fault {
                        adapter: AdapterKind::FrameScan,
                        error: e.to_string(),
                    })
                    .await;
                return;
            }
        };

        // Cooldown: a single physical presentation decodes on many
        // consecutive frames. Only the first detection inside the window is
        // processed; the stamp is refreshed on every processed detection.
        let now = Instant::now();
        if let Some(prev) = last_detection
            && now.duration_since(prev) < config.cooldown
        {
            continue;
        }
        last_detection = Some(now);

        let event = match attend_token::decode(&payload) {
            Ok(token) => CaptureEvent::scan_now(ScanEvent::TokenScan { token }),
            Err(error) => CaptureEvent::Malformed { error },
        };

        if tx.send(event).await.is_err() {
            return; // consumer gone
        }
    }
}

/// Sleep for `delay`, returning `true` if cancellation fired first.
async fn wait_or_cancelled(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(delay) => false,
    }
}
