//! Radio stack adapter model.
//!
//! The underlying BLE stack is treated as an event source and a command sink:
//! it raises [`AdapterEvent`]s (power state changes, advertising results,
//! client connect/disconnect, MTU changes) and accepts [`AdapterCommand`]s
//! (register services, start/stop advertising). The [`RadioStack`] trait is
//! the seam between the lifecycle state machine and whatever stack glue
//! delivers the real radio.

use std::fmt;
use std::str::FromStr;

/// Power state of the Bluetooth adapter.
///
/// Mirrors the state strings reported by BlueZ-backed stacks. Only
/// `PoweredOn` permits service registration and advertising; everything
/// else tears services down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// State not yet reported.
    Unknown,
    /// Adapter is resetting.
    Resetting,
    /// BLE is not supported on this host.
    Unsupported,
    /// Process lacks permission to use the adapter.
    Unauthorized,
    /// Adapter is powered off.
    PoweredOff,
    /// Adapter is powered on and usable.
    PoweredOn,
}

impl AdapterState {
    /// String form as reported by the stack.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Resetting => "resetting",
            Self::Unsupported => "unsupported",
            Self::Unauthorized => "unauthorized",
            Self::PoweredOff => "poweredOff",
            Self::PoweredOn => "poweredOn",
        }
    }

    /// Whether registration and advertising may be attempted.
    #[inline]
    pub fn is_powered_on(&self) -> bool {
        matches!(self, Self::PoweredOn)
    }
}

impl FromStr for AdapterState {
    type Err = UnknownStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Self::Unknown),
            "resetting" => Ok(Self::Resetting),
            "unsupported" => Ok(Self::Unsupported),
            "unauthorized" => Ok(Self::Unauthorized),
            "poweredOff" => Ok(Self::PoweredOff),
            "poweredOn" => Ok(Self::PoweredOn),
            _ => Err(UnknownStateError(s.to_string())),
        }
    }
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for an adapter state string the stack glue does not recognise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStateError(pub String);

impl fmt::Display for UnknownStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown adapter state: {}", self.0)
    }
}

impl std::error::Error for UnknownStateError {}

/// Lifecycle event raised by the radio stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    /// Adapter power state changed.
    StateChange(AdapterState),
    /// Result of a service registration request. `None` means success.
    ServicesSet { error: Option<String> },
    /// Result of an advertising start request. `None` means success.
    AdvertisingStart { error: Option<String> },
    /// Advertising stopped (requested or stack-initiated).
    AdvertisingStop,
    /// A central connected.
    Accept { client: String },
    /// A central disconnected.
    Disconnect { client: String },
    /// Negotiated ATT MTU changed.
    MtuChange { mtu: usize, client: Option<String> },
}

/// Description of the GATT service this peripheral registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Service UUID.
    pub uuid: String,
    /// Characteristic UUIDs contained in the service.
    pub characteristic_uuids: Vec<String>,
}

impl ServiceDescriptor {
    /// The Wi-Fi provisioning service.
    pub fn provisioning() -> Self {
        Self {
            uuid: crate::device::SERVICE_UUID.to_string(),
            characteristic_uuids: vec![
                crate::device::WIFI_CHAR_UUID.to_string(),
                crate::device::DEVICE_INFO_CHAR_UUID.to_string(),
            ],
        }
    }
}

/// Command issued to the radio stack.
///
/// Commands are fire-and-forget: their results come back asynchronously as
/// [`AdapterEvent`]s (`ServicesSet`, `AdvertisingStart`, `AdvertisingStop`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterCommand {
    /// Register the GATT service with the stack.
    RegisterServices(ServiceDescriptor),
    /// Remove all registered services.
    ClearServices,
    /// Start advertising under `name` with the given service UUIDs.
    StartAdvertising {
        name: String,
        service_uuids: Vec<String>,
    },
    /// Stop advertising.
    StopAdvertising,
}

/// Command sink for the radio stack.
///
/// Implementations deliver commands to the real stack (or record them in
/// tests). Submission must not block; results arrive as events.
pub trait RadioStack {
    /// Submit a command to the stack.
    fn submit(&mut self, command: AdapterCommand);
}
