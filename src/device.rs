//! Fixed device identity.
//!
//! The serial number and MAC address are authoritative locally: values a
//! client supplies in a provisioning payload are overwritten with these
//! before the configuration is persisted.

/// GATT service UUID advertised by the peripheral.
pub const SERVICE_UUID: &str = "12345678-1234-5678-9abc-123456789abc";

/// UUID for the Wi-Fi configuration characteristic (write / write-without-response).
pub const WIFI_CHAR_UUID: &str = "12345678-1234-5678-9abc-123456789abd";

/// UUID for the device-info characteristic (read).
pub const DEVICE_INFO_CHAR_UUID: &str = "12345678-1234-5678-9abc-123456789abe";

/// Canonical path of the persisted Wi-Fi configuration document.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/smartwardrobe/config.json";

/// Identity of the device this peripheral runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Human-readable device name (truncated for advertising).
    pub name: String,
    /// Fixed serial number.
    pub serial: String,
    /// Fixed MAC address.
    pub mac: String,
    /// Firmware version string.
    pub firmware_version: String,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            name: "SmartWardrobe".to_string(),
            serial: "0001".to_string(),
            mac: "2c:cf:67:c6:97:2c".to_string(),
            firmware_version: "1.0.1".to_string(),
        }
    }
}
