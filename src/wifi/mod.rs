//! Wi-Fi configuration protocol.
//!
//! # Components
//!
//! - [`config`] - payload parsing, validation, and the persisted record
//! - [`storage`] - atomic write-then-rename persistence of the config document
//! - [`connect`] - external nmcli connect trigger with bounded timeout

pub mod config;
pub mod connect;
pub mod storage;

pub use config::{parse_payload, ConfigError, ProvisionRequest, WifiConfigRecord};
pub use connect::{ConnectOutcome, CONNECT_TIMEOUT};
pub use storage::{default_config_path, ensure_config_dir, load_config, save_config};
