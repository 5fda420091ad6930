//! External Wi-Fi connect trigger.
//!
//! Joining the configured network is delegated to the OS network manager:
//! `nmcli device wifi connect ... || nmcli connection up ...` run through the
//! shell, bounded by a timeout. The attempt is fire-and-forget relative to
//! the characteristic write that triggered it; the outcome is only logged.

use log::{debug, error, info};
use std::time::Duration;
use tokio::process::Command;

/// How long a connect attempt may run before it is abandoned.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one connect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// nmcli exited successfully.
    Success { output: String },
    /// nmcli exited non-zero or could not be spawned.
    Failed { reason: String },
    /// The attempt exceeded [`CONNECT_TIMEOUT`].
    TimedOut,
}

impl std::fmt::Display for ConnectOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success { output } => write!(f, "connected: {}", output.trim()),
            Self::Failed { reason } => write!(f, "failed: {}", reason),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Escape double quotes for interpolation inside a double-quoted shell word.
fn escape_quotes(s: &str) -> String {
    s.replace('"', "\\\"")
}

/// Build the shell command for one connect attempt.
///
/// Falls back to re-activating an existing connection profile when the
/// initial connect fails (e.g. the credentials are already stored).
fn build_connect_command(ssid: &str, password: &str) -> String {
    let ssid = escape_quotes(ssid);
    let password = escape_quotes(password);
    format!(
        r#"nmcli device wifi connect "{ssid}" password "{password}" 2>&1 || nmcli connection up "{ssid}" 2>&1"#
    )
}

/// Attempt to join the network, bounded by `timeout`.
pub async fn connect(ssid: &str, password: &str, timeout: Duration) -> ConnectOutcome {
    info!("Starting WiFi connection to: {}", ssid);
    let cmd = build_connect_command(ssid, password);

    let result = tokio::time::timeout(
        timeout,
        Command::new("sh").arg("-c").arg(&cmd).output(),
    )
    .await;

    match result {
        Err(_) => {
            error!("WiFi connection attempt timed out after {:?}", timeout);
            ConnectOutcome::TimedOut
        }
        Ok(Err(e)) => {
            error!("Failed to spawn nmcli: {}", e);
            ConnectOutcome::Failed {
                reason: e.to_string(),
            }
        }
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            if output.status.success() {
                info!("WiFi connection successful: {}", stdout.trim());
                log_device_ip().await;
                ConnectOutcome::Success { output: stdout }
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                error!("WiFi connection failed ({})", output.status);
                debug!("stdout: {} stderr: {}", stdout.trim(), stderr.trim());
                ConnectOutcome::Failed {
                    reason: format!("{}: {}", output.status, stdout.trim()),
                }
            }
        }
    }
}

/// Best-effort lookup of the device IP after a successful join.
async fn log_device_ip() {
    if let Ok(output) = Command::new("hostname").arg("-I").output().await {
        let out = String::from_utf8_lossy(&output.stdout);
        if let Some(ip) = out.split_whitespace().next() {
            info!("Device IP: {}", ip);
        }
    }
}
