//! Atomic persistence of the Wi-Fi configuration document.
//!
//! The record is written to `<path>.tmp` and renamed over the canonical
//! path, so a reader of the canonical path never observes a partially
//! written document and a failed write leaves any previous configuration
//! untouched.

use super::config::WifiConfigRecord;
use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default canonical config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(crate::device::DEFAULT_CONFIG_PATH)
}

/// Create the config directory if it does not exist yet.
pub fn ensure_config_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            info!("Config directory created: {:?}", parent);
        }
    }
    Ok(())
}

/// Persist the record atomically at `path`.
pub fn save_config(path: &Path, record: &WifiConfigRecord) -> io::Result<()> {
    let json = serde_json::to_vec_pretty(record)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let tmp_path = tmp_path_for(path);
    if let Err(e) = fs::write(&tmp_path, &json) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path)?;

    info!("Config saved to {:?}", path);
    Ok(())
}

/// Load the current record from `path`.
///
/// Returns `None` if no config is stored or if it cannot be parsed.
pub fn load_config(path: &Path) -> Option<WifiConfigRecord> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("No config file at {:?}", path);
            return None;
        }
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Failed to parse stored config: {}", e);
            None
        }
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}
