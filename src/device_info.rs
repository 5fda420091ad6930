//! Device-info characteristic payload.
//!
//! The payload is a small JSON document computed once at construction and
//! served read-only. Centrals retrieve it with the standard GATT long-read
//! contract: successive reads at increasing offsets until a short (or empty)
//! chunk comes back, so the provider only ever hands out suffixes.

use crate::device::DeviceIdentity;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::fmt;

/// JSON shape of the device-info payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviceInfo<'a> {
    serial_number: &'a str,
    mac_address: &'a str,
    device_name: &'a str,
    firmware_version: &'a str,
    timestamp: DateTime<Utc>,
    bluetooth_ready: bool,
}

/// Read error for the device-info characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// Requested offset lies beyond the payload.
    InvalidOffset { offset: usize, len: usize },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOffset { offset, len } => {
                write!(f, "invalid offset {} (payload length {})", offset, len)
            }
        }
    }
}

impl std::error::Error for ReadError {}

/// Precomputed, immutable device-info payload with offset-chunked reads.
#[derive(Debug)]
pub struct DeviceInfoProvider {
    payload: Vec<u8>,
}

impl DeviceInfoProvider {
    /// Build the payload from the device identity, stamped with the current
    /// time. The timestamp is a construction-time snapshot, not refreshed
    /// per read.
    pub fn new(identity: &DeviceIdentity) -> Self {
        Self::at(identity, Utc::now())
    }

    /// [`DeviceInfoProvider::new`] with an explicit timestamp.
    pub fn at(identity: &DeviceIdentity, timestamp: DateTime<Utc>) -> Self {
        let info = DeviceInfo {
            serial_number: &identity.serial,
            mac_address: &identity.mac,
            device_name: &identity.name,
            firmware_version: &identity.firmware_version,
            timestamp,
            bluetooth_ready: true,
        };
        // Serialization of a struct of strings and a timestamp cannot fail.
        let payload = serde_json::to_vec(&info).unwrap_or_default();
        debug!("Device info prepared, size: {}", payload.len());
        Self { payload }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Return the payload suffix starting at `offset`.
    ///
    /// An offset equal to the payload length yields an empty chunk, which is
    /// how a long-read sequence terminates; anything beyond is an error.
    pub fn read_at(&self, offset: usize) -> Result<&[u8], ReadError> {
        if offset > self.payload.len() {
            return Err(ReadError::InvalidOffset {
                offset,
                len: self.payload.len(),
            });
        }
        Ok(&self.payload[offset..])
    }
}
