//! Tuning constants shared across the attendance capture stack.

use std::time::Duration;

/// Minimum accepted subject identifier length (after normalization).
pub const MIN_SUBJECT_ID_LENGTH: usize = 2;

/// Maximum accepted subject identifier length.
///
/// Matric numbers observed in the field are short ("21/0331"), but badge
/// serials can be longer, so the cap is generous.
pub const MAX_SUBJECT_ID_LENGTH: usize = 32;

/// Maximum accepted course identifier length ("CS-404" style codes).
pub const MAX_COURSE_ID_LENGTH: usize = 16;

/// Global detection cooldown for the frame-scan adapter.
///
/// A single physical presentation of a code in front of the camera decodes
/// on many consecutive frames. Any detection arriving within this window of
/// the previously processed detection is dropped unconditionally,
/// independent of nonce.
pub const SCAN_COOLDOWN: Duration = Duration::from_millis(2000);

/// Cadence of the frame-scan adapter's cooperative poll loop (~30 Hz).
pub const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(33);

/// Delay before an automatic restart attempt after the video stream is lost.
pub const STREAM_RESTART_DELAY: Duration = Duration::from_millis(100);

/// Prefix of nonces synthesized for raw peripheral input.
///
/// Device-generated nonces are `"DEVICE-" + arrival millis`. By construction
/// they never collide with producer-issued nonces and never repeat for the
/// same physical tap, which is a weaker guarantee than a true
/// per-presentation nonce: it prevents double-processing of one event, not
/// replay of the same card across time.
pub const DEVICE_NONCE_PREFIX: &str = "DEVICE-";

/// Observed nonce rotation cadence of the issuing device.
///
/// The presenting side refreshes its payload every 60 seconds to limit the
/// replay window before a scan ever happens. The capture side does not
/// enforce this; it is documented here because mock producers honor it.
pub const TOKEN_ROTATION_INTERVAL: Duration = Duration::from_secs(60);

/// How long a rejection status message stays on screen before auto-clear.
pub const STATUS_CLEAR_AFTER: Duration = Duration::from_millis(2000);

/// How long an acceptance status message stays on screen before auto-clear.
pub const SUCCESS_CLEAR_AFTER: Duration = Duration::from_millis(3000);
