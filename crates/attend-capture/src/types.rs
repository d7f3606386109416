//! Common types shared across capture device implementations.

use serde::{Deserialize, Serialize};

/// Generic device information.
///
/// Metadata about a capture device such as name, model, and firmware
/// version, surfaced in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "Mock Camera", "HID Wedge").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional device serial number.
    pub serial_number: Option<String>,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            serial_number: None,
            firmware_version: None,
        }
    }

    /// Set the serial number.
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_builder_chain() {
        let info = DeviceInfo::new("Mock Camera", "Virtual v1")
            .with_serial_number("0001")
            .with_firmware_version("1.0.0");

        assert_eq!(info.name, "Mock Camera");
        assert_eq!(info.model, "Virtual v1");
        assert_eq!(info.serial_number.as_deref(), Some("0001"));
        assert_eq!(info.firmware_version.as_deref(), Some("1.0.0"));
    }
}
