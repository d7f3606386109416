//! Enum wrappers for capture device dispatch.
//!
//! Native `async fn` in traits (RPITIT, Edition 2024) is not object-safe, so
//! `Box<dyn FrameSource>` is not an option. These enums provide concrete
//! type dispatch at compile time: zero-cost, type-safe, and extensible
//! behind feature flags when real hardware backends land.

use crate::error::Result;
use crate::mock::{MockCamera, MockWedge};
use crate::traits::{FrameSource, KeystrokeInput, KeystrokePeripheral};
use crate::types::DeviceInfo;

/// Enum wrapper for frame source dispatch.
///
/// # Examples
///
/// ```
/// use attend_capture::devices::AnyFrameSource;
/// use attend_capture::mock::MockCamera;
///
/// let (camera, _handle) = MockCamera::new();
/// let source = AnyFrameSource::Mock(camera);
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyFrameSource {
    /// Mock camera for development and testing.
    Mock(MockCamera),
    // Planned variants behind feature flags:
    // - V4l2(V4l2Camera) - Video4Linux2 capture devices
    // - Uvc(UvcCamera) - portable USB video class backend
}

impl FrameSource for AnyFrameSource {
    async fn acquire(&mut self) -> Result<()> {
        match self {
            Self::Mock(source) => source.acquire().await,
        }
    }

    fn is_alive(&self) -> bool {
        match self {
            Self::Mock(source) => source.is_alive(),
        }
    }

    async fn poll_symbol(&mut self) -> Result<Option<String>> {
        match self {
            Self::Mock(source) => source.poll_symbol().await,
        }
    }

    async fn release(&mut self) {
        match self {
            Self::Mock(source) => source.release().await,
        }
    }

    async fn info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(source) => source.info().await,
        }
    }
}

/// Enum wrapper for keystroke peripheral dispatch.
///
/// # Examples
///
/// ```
/// use attend_capture::devices::AnyKeystrokePeripheral;
/// use attend_capture::mock::MockWedge;
///
/// let (wedge, _handle) = MockWedge::new();
/// let peripheral = AnyKeystrokePeripheral::Mock(wedge);
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyKeystrokePeripheral {
    /// Mock wedge peripheral for development and testing.
    Mock(MockWedge),
    // Planned variants behind feature flags:
    // - Hid(HidWedge) - USB HID keyboard-wedge readers
    // - Serial(SerialWedge) - serial line readers
}

impl KeystrokePeripheral for AnyKeystrokePeripheral {
    async fn read_input(&mut self) -> Result<KeystrokeInput> {
        match self {
            Self::Mock(peripheral) => peripheral.read_input().await,
        }
    }

    async fn focus(&mut self) -> Result<()> {
        match self {
            Self::Mock(peripheral) => peripheral.focus().await,
        }
    }

    async fn info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(peripheral) => peripheral.info().await,
        }
    }
}
