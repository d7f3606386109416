//! Capture engine: two interchangeable input adapters normalizing raw input
//! into one discrete scan-event stream.
//!
//! The frame-scan adapter owns a video source and runs a cooperative
//! per-frame poll loop; the keystroke adapter reacts to lines submitted by
//! an external peripheral. Both are activated by the session controller and
//! deliver [`CaptureEvent`]s through a [`ScanFeed`] handle until stopped.
//!
//! All device traits use native `async fn` methods (Edition 2024 RPITIT);
//! dynamic dispatch goes through the enum wrappers in [`devices`].

#![allow(async_fn_in_trait)]

pub mod devices;
pub mod error;
pub mod events;
pub mod feed;
pub mod frame_scan;
pub mod keystroke;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{CaptureError, Result};
pub use events::{AdapterKind, CaptureEvent, ScanEvent};
pub use feed::ScanFeed;
pub use frame_scan::FrameScanConfig;
pub use keystroke::SessionBinding;
pub use traits::{FrameSource, KeystrokeInput, KeystrokePeripheral};
pub use types::DeviceInfo;
