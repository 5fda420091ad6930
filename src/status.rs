//! HTTP status server for provisioning monitoring.
//!
//! Provides a simple `/status` endpoint that returns the peripheral state as
//! JSON, served by `tiny_http` from a background thread.
//!
//! # Example Response
//!
//! ```json
//! {
//!   "uptime_secs": 120,
//!   "adapter_state": "poweredOn",
//!   "advertising": true,
//!   "connected": false,
//!   "config_received": true,
//!   "writes_accepted": 1,
//!   "writes_rejected": 0,
//!   "info_reads": 4
//! }
//! ```

use crate::ble::adapter::AdapterState;
use log::{error, info, warn};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tiny_http::{Method, Response, Server};

/// Default port for the status server.
pub const DEFAULT_STATUS_PORT: u16 = 8080;

/// Shared provisioning state counters.
///
/// Updated by the event loop, read by the status server thread. All fields
/// are atomics so no locking is needed across threads.
#[derive(Debug)]
pub struct ProvisionStats {
    /// When the server started.
    start_time: Instant,
    /// Current adapter state (encoded, see `state_code`).
    adapter_state: AtomicU8,
    /// Whether the peripheral is advertising.
    pub advertising: AtomicBool,
    /// Whether a central is connected.
    pub connected: AtomicBool,
    /// Whether a valid configuration has been persisted since startup.
    pub config_received: AtomicBool,
    /// Characteristic writes that produced a persisted config.
    pub writes_accepted: AtomicUsize,
    /// Characteristic writes rejected (busy, malformed, bad offset).
    pub writes_rejected: AtomicUsize,
    /// Device-info characteristic reads served.
    pub info_reads: AtomicUsize,
}

impl ProvisionStats {
    /// Create a fresh stats container.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            adapter_state: AtomicU8::new(state_code(AdapterState::Unknown)),
            advertising: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            config_received: AtomicBool::new(false),
            writes_accepted: AtomicUsize::new(0),
            writes_rejected: AtomicUsize::new(0),
            info_reads: AtomicUsize::new(0),
        }
    }

    /// Record the current adapter state.
    pub fn set_adapter_state(&self, state: AdapterState) {
        self.adapter_state.store(state_code(state), Ordering::Relaxed);
    }

    /// Currently recorded adapter state.
    pub fn adapter_state(&self) -> AdapterState {
        state_from_code(self.adapter_state.load(Ordering::Relaxed))
    }

    /// Uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Serialize the snapshot to JSON.
    pub fn to_json(&self) -> String {
        format!(
            r#"{{"uptime_secs":{},"adapter_state":"{}","advertising":{},"connected":{},"config_received":{},"writes_accepted":{},"writes_rejected":{},"info_reads":{}}}"#,
            self.uptime_secs(),
            self.adapter_state(),
            self.advertising.load(Ordering::Relaxed),
            self.connected.load(Ordering::Relaxed),
            self.config_received.load(Ordering::Relaxed),
            self.writes_accepted.load(Ordering::Relaxed),
            self.writes_rejected.load(Ordering::Relaxed),
            self.info_reads.load(Ordering::Relaxed),
        )
    }
}

impl Default for ProvisionStats {
    fn default() -> Self {
        Self::new()
    }
}

fn state_code(state: AdapterState) -> u8 {
    match state {
        AdapterState::Unknown => 0,
        AdapterState::Resetting => 1,
        AdapterState::Unsupported => 2,
        AdapterState::Unauthorized => 3,
        AdapterState::PoweredOff => 4,
        AdapterState::PoweredOn => 5,
    }
}

fn header(name: &str, value: &str) -> tiny_http::Header {
    // Only called with static ASCII names and values.
    tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("static header")
}

/// Map one request onto its response.
fn route(
    method: &Method,
    url: &str,
    stats: &ProvisionStats,
) -> Response<std::io::Cursor<Vec<u8>>> {
    match (method, url) {
        (Method::Get, "/status") | (Method::Get, "/status/") => {
            Response::from_string(stats.to_json())
                .with_header(header("Content-Type", "application/json"))
        }
        (Method::Get, "/") => Response::from_string("See /status for peripheral state")
            .with_status_code(302)
            .with_header(header("Location", "/status")),
        (Method::Get, _) => Response::from_string("Not Found").with_status_code(404),
        _ => Response::from_string("Method Not Allowed")
            .with_status_code(405)
            .with_header(header("Allow", "GET")),
    }
}

fn state_from_code(code: u8) -> AdapterState {
    match code {
        1 => AdapterState::Resetting,
        2 => AdapterState::Unsupported,
        3 => AdapterState::Unauthorized,
        4 => AdapterState::PoweredOff,
        5 => AdapterState::PoweredOn,
        _ => AdapterState::Unknown,
    }
}

/// HTTP status server.
///
/// Runs in a background thread and serves the stats snapshot as JSON.
pub struct StatusServer {
    /// Server thread handle.
    handle: Option<thread::JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl StatusServer {
    /// Start the status server.
    ///
    /// `bind_addr` defaults to 0.0.0.0 when `None`. Drop the returned handle
    /// to stop the server.
    pub fn start(
        bind_addr: Option<IpAddr>,
        port: u16,
        stats: Arc<ProvisionStats>,
    ) -> Result<Self, std::io::Error> {
        let addr = match bind_addr {
            Some(ip) => format!("{}:{}", ip, port),
            None => format!("0.0.0.0:{}", port),
        };

        let server = Server::http(&addr)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrInUse, format!("{}", e)))?;

        info!("Status server listening on http://{}/status", addr);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::spawn(move || {
            Self::run_server(server, stats, shutdown_clone);
        });

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    fn run_server(server: Server, stats: Arc<ProvisionStats>, shutdown: Arc<AtomicBool>) {
        while !shutdown.load(Ordering::Acquire) {
            // Short poll so the shutdown flag is observed promptly.
            let request = match server.recv_timeout(std::time::Duration::from_millis(100)) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(e) => {
                    error!("Status server error: {}", e);
                    return;
                }
            };

            let response = route(request.method(), request.url(), &stats);
            if let Err(e) = request.respond(response) {
                warn!("Failed to send response: {}", e);
            }
        }
        info!("Status server shutting down");
    }

    /// Stop the server.
    ///
    /// Note: May take up to 100ms due to polling interval.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusServer {
    fn drop(&mut self) {
        self.stop();
    }
}
