//! Status messages shown during attendance capture.
//!
//! Every rejection class maps to a short transient message that auto-clears
//! after [`STATUS_CLEAR_AFTER`](attend_core::constants::STATUS_CLEAR_AFTER)
//! (acceptances use the longer
//! [`SUCCESS_CLEAR_AFTER`](attend_core::constants::SUCCESS_CLEAR_AFTER)).
//! Messages are compile-time constants; the presentation layer owns layout
//! and styling.

/// Status messages for the capture surface.
pub struct StatusMessages;

impl StatusMessages {
    /// Idle prompt while the camera is scanning.
    pub const PROMPT: &'static str = "Position QR code in frame";

    /// Payload detected but not decodable.
    pub const MALFORMED: &'static str = "Invalid code format";

    /// Nonce already consumed this session.
    pub const REPLAY: &'static str = "Already scanned";

    /// Token issued for a different course.
    pub const WRONG_COURSE: &'static str = "Wrong course code";

    /// Subject already holds a mark this session.
    pub const DUPLICATE: &'static str = "Student already marked present";

    /// Durable write failed; the local mark stands.
    pub const PERSISTENCE: &'static str = "Database error - record kept locally";

    /// Camera could not be acquired.
    pub const CAMERA_UNAVAILABLE: &'static str = "Could not access camera";

    /// Peripheral waiting for input.
    pub const DEVICE_WAITING: &'static str = "Ready for device input";

    /// Acceptance message for a subject.
    #[must_use]
    pub fn marked_present(label: &str) -> String {
        format!("{label} marked present")
    }
}
