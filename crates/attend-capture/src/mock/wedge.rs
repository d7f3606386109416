//! Mock keystroke-wedge peripheral for testing and development.
//!
//! Simulates an external device that types identifiers into a focused input
//! field and submits them as whole lines.

use crate::{
    Result,
    error::CaptureError,
    traits::{KeystrokeInput, KeystrokePeripheral},
    types::DeviceInfo,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;

/// Mock keystroke-wedge peripheral.
///
/// # Examples
///
/// ```
/// use attend_capture::mock::MockWedge;
/// use attend_capture::traits::{KeystrokeInput, KeystrokePeripheral};
///
/// #[tokio::main]
/// async fn main() -> attend_capture::Result<()> {
///     let (mut wedge, handle) = MockWedge::new();
///
///     handle.type_line("21/0331").await?;
///
///     let input = wedge.read_input().await?;
///     assert_eq!(input, KeystrokeInput::Line("21/0331".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockWedge {
    /// Channel receiver for simulated input
    input_rx: mpsc::Receiver<KeystrokeInput>,

    /// Device name
    name: String,

    /// Number of focus assertions observed
    focus_count: Arc<AtomicU32>,
}

impl MockWedge {
    /// Create a new mock wedge with the default name.
    ///
    /// Returns a tuple of (MockWedge, MockWedgeHandle) where the handle
    /// simulates input from the physical device.
    pub fn new() -> (Self, MockWedgeHandle) {
        Self::with_name("Mock Wedge".to_string())
    }

    /// Create a new mock wedge with a custom name.
    pub fn with_name(name: String) -> (Self, MockWedgeHandle) {
        let (input_tx, input_rx) = mpsc::channel(32);
        let focus_count = Arc::new(AtomicU32::new(0));

        let wedge = Self {
            input_rx,
            name: name.clone(),
            focus_count: Arc::clone(&focus_count),
        };

        let handle = MockWedgeHandle {
            input_tx,
            focus_count,
            name,
        };

        (wedge, handle)
    }
}

impl KeystrokePeripheral for MockWedge {
    async fn read_input(&mut self) -> Result<KeystrokeInput> {
        self.input_rx
            .recv()
            .await
            .ok_or_else(|| CaptureError::disconnected(&self.name))
    }

    async fn focus(&mut self) -> Result<()> {
        self.focus_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Wedge v1.0").with_firmware_version("1.0.0"))
    }
}

/// Handle for controlling a mock wedge.
///
/// Can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockWedgeHandle {
    /// Channel sender for simulated input
    input_tx: mpsc::Sender<KeystrokeInput>,

    /// Shared focus assertion counter
    focus_count: Arc<AtomicU32>,

    /// Device name
    name: String,
}

impl MockWedgeHandle {
    /// Submit a line of text as the physical device would.
    ///
    /// # Errors
    ///
    /// Returns an error if the wedge has been dropped and the channel is
    /// closed.
    pub async fn type_line(&self, line: impl Into<String>) -> Result<()> {
        self.input_tx
            .send(KeystrokeInput::Line(line.into()))
            .await
            .map_err(|_| CaptureError::disconnected(&self.name))
    }

    /// Simulate the input target losing focus.
    ///
    /// # Errors
    ///
    /// Returns an error if the wedge has been dropped and the channel is
    /// closed.
    pub async fn lose_focus(&self) -> Result<()> {
        self.input_tx
            .send(KeystrokeInput::FocusLost)
            .await
            .map_err(|_| CaptureError::disconnected(&self.name))
    }

    /// Number of focus assertions the adapter has performed so far.
    pub fn focus_count(&self) -> u32 {
        self.focus_count.load(Ordering::Relaxed)
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
