//! Provisioning payload parsing and the persisted configuration record.
//!
//! A reassembled characteristic write carries UTF-8 text in one of two
//! formats:
//!
//! - JSON (payload starts with `{`):
//!   `{"ssid":"Home","password":"secret","apiKey":...,"deviceSerial":...,"backendUrl":...}`
//! - positional fallback: `ssid;password;apiKey;deviceSerial;backendUrl`,
//!   with a default backend URL when the field is absent.
//!
//! `ssid` and `password` are required and must be non-empty; everything else
//! is optional. The device serial and MAC in the persisted record always
//! come from the local [`DeviceIdentity`], never from the client.

use crate::device::DeviceIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Backend URL substituted when a payload does not name one.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// A parsed, validated provisioning request.
///
/// Credential fields are zeroed on drop.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ProvisionRequest {
    /// Network SSID (required, non-empty).
    pub ssid: String,
    /// Network password (required, non-empty).
    pub password: String,
    /// Optional backend API key, passed through unvalidated.
    pub api_key: Option<String>,
    /// Client-supplied serial, ignored in favour of the local identity.
    pub device_serial: Option<String>,
    /// Backend URL; defaults to [`DEFAULT_BACKEND_URL`] when absent.
    pub backend_url: Option<String>,
}

/// Raw JSON shape of a provisioning payload. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPayload {
    ssid: Option<String>,
    password: Option<String>,
    api_key: Option<String>,
    device_serial: Option<String>,
    backend_url: Option<String>,
}

/// Errors from parsing or validating a provisioning payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Payload started with `{` but is not valid JSON.
    InvalidJson(String),
    /// `ssid` missing or empty.
    MissingSsid,
    /// `password` missing or empty.
    MissingPassword,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(msg) => write!(f, "malformed JSON payload: {}", msg),
            Self::MissingSsid => write!(f, "payload is missing a non-empty ssid"),
            Self::MissingPassword => write!(f, "payload is missing a non-empty password"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate a reassembled payload.
pub fn parse_payload(payload: &[u8]) -> Result<ProvisionRequest, ConfigError> {
    let text = String::from_utf8_lossy(payload);
    let text = text.trim();

    let raw = if text.starts_with('{') {
        serde_json::from_str::<RawPayload>(text)
            .map_err(|e| ConfigError::InvalidJson(e.to_string()))?
    } else {
        parse_positional(text)
    };

    let ssid = match raw.ssid {
        Some(s) if !s.is_empty() => s,
        _ => return Err(ConfigError::MissingSsid),
    };
    let password = match raw.password {
        Some(p) if !p.is_empty() => p,
        _ => return Err(ConfigError::MissingPassword),
    };

    Ok(ProvisionRequest {
        ssid,
        password,
        api_key: raw.api_key,
        device_serial: raw.device_serial,
        backend_url: raw.backend_url,
    })
}

/// Parse the semicolon-separated fallback format.
fn parse_positional(text: &str) -> RawPayload {
    let mut parts = text.split(';');
    let mut next = || parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    RawPayload {
        ssid: next(),
        password: next(),
        api_key: next(),
        device_serial: next(),
        backend_url: next().or_else(|| Some(DEFAULT_BACKEND_URL.to_string())),
    }
}

/// The single current Wi-Fi configuration, as persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiConfigRecord {
    pub ssid: String,
    pub password: String,
    pub api_key: Option<String>,
    /// Local fixed serial, overriding anything the client supplied.
    pub device_serial: String,
    pub backend_url: String,
    /// Local fixed MAC address.
    pub device_mac: String,
    /// When the payload was accepted.
    pub received_at: DateTime<Utc>,
}

impl WifiConfigRecord {
    /// Build a record from a validated request, stamping the current time
    /// and the authoritative local identity.
    pub fn new(request: &ProvisionRequest, identity: &DeviceIdentity) -> Self {
        Self::at(request, identity, Utc::now())
    }

    /// [`WifiConfigRecord::new`] with an explicit timestamp.
    pub fn at(
        request: &ProvisionRequest,
        identity: &DeviceIdentity,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ssid: request.ssid.clone(),
            password: request.password.clone(),
            api_key: request.api_key.clone(),
            device_serial: identity.serial.clone(),
            backend_url: request
                .backend_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            device_mac: identity.mac.clone(),
            received_at,
        }
    }
}
