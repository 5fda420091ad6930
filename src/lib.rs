//! SmartWardrobe BLE provisioning library.
//!
//! A headless device exposes one GATT service over which a phone app
//! delivers Wi-Fi credentials and reads device identity. Everything except
//! the radio stack glue lives here and is testable on a development host.

pub mod ble;
pub mod device;
pub mod device_info;
pub mod server;
pub mod status;
pub mod wifi;

// Re-export commonly used items
pub use ble::{AdapterEvent, AdapterState, LifecycleManager, RadioStack, WriteReassembler};
pub use device::DeviceIdentity;
pub use device_info::DeviceInfoProvider;
pub use server::{Event, NmcliConnector, ProvisionServer, ServerConfig, WifiConnector, WriteStatus};
pub use status::{ProvisionStats, StatusServer};
pub use wifi::{parse_payload, ConfigError, WifiConfigRecord};
