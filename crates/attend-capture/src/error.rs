//! Error types for capture adapter operations.

/// Result type alias for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Errors that can occur while acquiring or reading capture devices.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Opening the underlying stream or peripheral failed.
    ///
    /// Implementations must close any partially opened resource before
    /// returning this error.
    #[error("Acquisition failed: {device}: {message}")]
    AcquisitionFailed { device: String, message: String },

    /// An already-acquired stream stopped delivering frames.
    #[error("Stream lost: {device}")]
    StreamLost { device: String },

    /// Peripheral is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Input focus could not be re-asserted on the peripheral's target.
    #[error("Focus error: {message}")]
    FocusError { message: String },

    /// Invalid data received from a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Create a new acquisition failure error.
    pub fn acquisition(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AcquisitionFailed {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Create a new stream-lost error.
    pub fn stream_lost(device: impl Into<String>) -> Self {
        Self::StreamLost {
            device: device.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new focus error.
    pub fn focus(message: impl Into<String>) -> Self {
        Self::FocusError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Returns `true` if the error means the stream may recover on its own
    /// and the poll loop should retry silently.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StreamLost { .. })
    }
}
