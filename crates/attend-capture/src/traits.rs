//! Capture device trait definitions.
//!
//! These traits are the contract between the capture adapters and the
//! underlying input devices (video source, keyboard-wedge peripheral). They
//! enable substitution between mock and real hardware implementations; the
//! adapters in [`frame_scan`](crate::frame_scan) and
//! [`keystroke`](crate::keystroke) are written against them only.
//!
//! # Object Safety and Dynamic Dispatch
//!
//! These traits use native `async fn` methods (Edition 2024 RPITIT) and are
//! therefore not object-safe. For dynamic dispatch use the enum wrappers in
//! [`devices`](crate::devices).

use crate::error::Result;
use crate::types::DeviceInfo;

/// A source of video frames carrying optically encoded payloads.
///
/// The frame-scan adapter drives this through a cooperative poll loop: it
/// acquires the stream once, polls for decoded symbols each tick, and
/// releases the stream on every exit path.
///
/// # Acquisition Contract
///
/// `acquire` must not leave a half-opened stream behind: on failure any
/// partially opened resource is closed before the error is returned.
/// `release` must be idempotent; the adapter calls it defensively on
/// shutdown and before restart attempts.
pub trait FrameSource: Send + Sync {
    /// Open the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::AcquisitionFailed` if the stream cannot be
    /// opened. Implementations close any partially opened resource first.
    async fn acquire(&mut self) -> Result<()>;

    /// Returns `true` while the acquired stream is delivering frames.
    ///
    /// A stream that was acquired and later went away (device unplugged,
    /// track ended) reports `false`; the adapter then schedules a silent
    /// restart.
    fn is_alive(&self) -> bool;

    /// Poll the next frame for an optically encoded payload.
    ///
    /// Returns `Ok(Some(payload))` when the current frame contains a
    /// readable symbol, `Ok(None)` when no frame is ready or the frame has
    /// no symbol (both are silence, not errors).
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::StreamLost` when the stream died mid-read.
    async fn poll_symbol(&mut self) -> Result<Option<String>>;

    /// Release the stream. Idempotent; safe to call when never acquired.
    async fn release(&mut self);

    /// Get device information.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be queried.
    async fn info(&self) -> Result<DeviceInfo>;
}

/// Input from a keystroke peripheral.
///
/// The peripheral behaves like a keyboard: it types an identifier and
/// terminates it with a submission. It assumes a focused input field, so
/// focus loss is surfaced as an input event the adapter must react to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeystrokeInput {
    /// A submitted line of text (identifier or structured payload).
    Line(String),

    /// The input target lost focus; the adapter must re-assert it.
    FocusLost,
}

/// External keystroke peripheral abstraction (badge reader, fingerprint
/// terminal, barcode wedge — anything that emulates a keyboard).
pub trait KeystrokePeripheral: Send + Sync {
    /// Wait for the next input event from the peripheral.
    ///
    /// Blocks asynchronously until a line is submitted or focus is lost.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::Disconnected` when the peripheral goes away.
    async fn read_input(&mut self) -> Result<KeystrokeInput>;

    /// Re-assert input focus on the peripheral's target field.
    ///
    /// Called once on activation, after every submission, and whenever a
    /// `FocusLost` event is observed.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::FocusError` if focus cannot be re-asserted.
    async fn focus(&mut self) -> Result<()>;

    /// Get device information.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be queried.
    async fn info(&self) -> Result<DeviceInfo>;
}
