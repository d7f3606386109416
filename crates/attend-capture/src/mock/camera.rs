//! Mock camera implementation for testing and development.
//!
//! Simulates a video stream whose frames may or may not carry a decodable
//! symbol. The control handle scripts frames, stream loss, and acquisition
//! failures.

use crate::{
    Result,
    error::CaptureError,
    traits::FrameSource,
    types::DeviceInfo,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct CameraState {
    /// Scripted frames: `Some(payload)` is a frame with a readable symbol,
    /// `None` a blank frame.
    frames: VecDeque<Option<String>>,

    /// Stream currently held by the adapter.
    acquired: bool,

    /// Stream delivering frames (false after a scripted loss, until the
    /// next successful acquire).
    alive: bool,

    /// Number of upcoming acquire calls that should fail.
    fail_acquires: u32,
}

/// Mock camera for testing and development.
///
/// # Examples
///
/// ```
/// use attend_capture::mock::MockCamera;
/// use attend_capture::traits::FrameSource;
///
/// #[tokio::main]
/// async fn main() -> attend_capture::Result<()> {
///     let (mut camera, handle) = MockCamera::new();
///
///     camera.acquire().await?;
///     handle.present_payload("payload");
///
///     assert_eq!(camera.poll_symbol().await?, Some("payload".to_string()));
///     assert_eq!(camera.poll_symbol().await?, None); // queue drained
///
///     camera.release().await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockCamera {
    state: Arc<Mutex<CameraState>>,
    name: String,
}

impl MockCamera {
    /// Create a new mock camera with the default name.
    ///
    /// Returns a tuple of (MockCamera, MockCameraHandle) where the handle
    /// scripts the stream's behavior.
    pub fn new() -> (Self, MockCameraHandle) {
        Self::with_name("Mock Camera".to_string())
    }

    /// Create a new mock camera with a custom name.
    pub fn with_name(name: String) -> (Self, MockCameraHandle) {
        let state = Arc::new(Mutex::new(CameraState::default()));

        let camera = Self {
            state: Arc::clone(&state),
            name: name.clone(),
        };

        let handle = MockCameraHandle { state, name };

        (camera, handle)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CameraState> {
        self.state.lock().expect("camera state poisoned")
    }
}

impl FrameSource for MockCamera {
    async fn acquire(&mut self) -> Result<()> {
        let mut state = self.lock();
        if state.fail_acquires > 0 {
            state.fail_acquires -= 1;
            // Nothing is left half-open: the mock models the contract that
            // a failed acquire closes any partial resource before erroring.
            state.acquired = false;
            return Err(CaptureError::acquisition(&self.name, "stream unavailable"));
        }
        state.acquired = true;
        state.alive = true;
        Ok(())
    }

    fn is_alive(&self) -> bool {
        let state = self.lock();
        state.acquired && state.alive
    }

    async fn poll_symbol(&mut self) -> Result<Option<String>> {
        let mut state = self.lock();
        if !state.acquired || !state.alive {
            return Err(CaptureError::stream_lost(&self.name));
        }
        Ok(state.frames.pop_front().flatten())
    }

    async fn release(&mut self) {
        self.lock().acquired = false;
    }

    async fn info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Virtual Stream v1").with_firmware_version("1.0.0"))
    }
}

/// Handle for scripting a mock camera.
///
/// Can be cloned and shared across tasks; all clones drive the same stream.
#[derive(Debug, Clone)]
pub struct MockCameraHandle {
    state: Arc<Mutex<CameraState>>,
    name: String,
}

impl MockCameraHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, CameraState> {
        self.state.lock().expect("camera state poisoned")
    }

    /// Queue a frame carrying a decodable symbol payload.
    pub fn present_payload(&self, payload: impl Into<String>) {
        self.lock().frames.push_back(Some(payload.into()));
    }

    /// Queue a frame with no symbol in it.
    pub fn present_blank(&self) {
        self.lock().frames.push_back(None);
    }

    /// Simulate losing the stream (device unplugged, track ended).
    ///
    /// The stream stays dead until the adapter re-acquires it.
    pub fn drop_stream(&self) {
        self.lock().alive = false;
    }

    /// Make the next `count` acquire attempts fail.
    pub fn fail_next_acquires(&self, count: u32) {
        self.lock().fail_acquires = count;
    }

    /// Returns `true` while the adapter holds the stream.
    ///
    /// This is the observable "no track remains active" check used by
    /// release-on-deactivation tests.
    pub fn is_acquired(&self) -> bool {
        self.lock().acquired
    }

    /// Number of scripted frames not yet consumed.
    pub fn pending_frames(&self) -> usize {
        self.lock().frames.len()
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
