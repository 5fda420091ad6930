//! SmartWardrobe BLE provisioning server.
//!
//! Runs the provisioning event loop with a loopback radio stack, plus the
//! HTTP status endpoint at http://localhost:8080/status. On a device build
//! the loopback stack is replaced by real adapter glue feeding the same
//! event channel.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin ble-server
//! ```

use log::{error, info, warn};
use smartwardrobe_ble::ble::{AdapterEvent, AdapterState, LoopbackStack};
use smartwardrobe_ble::server::{
    event_channel, shutdown_signal, Event, NmcliConnector, ProvisionServer, ServerConfig,
};
use smartwardrobe_ble::status::{ProvisionStats, StatusServer, DEFAULT_STATUS_PORT};
use smartwardrobe_ble::wifi::storage::{ensure_config_dir, load_config};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== SmartWardrobe BLE Server starting ===");

    let config = ServerConfig::default();
    info!(
        "Device: {} (serial {}, firmware {})",
        config.identity.name, config.identity.serial, config.identity.firmware_version
    );

    if let Err(e) = ensure_config_dir(&config.config_path) {
        warn!("Could not create config directory: {}", e);
        warn!("Config writes will fail until {:?} is writable", config.config_path);
    }
    if let Some(existing) = load_config(&config.config_path) {
        info!("Existing config found for SSID: {}", existing.ssid);
    }

    let stats = Arc::new(ProvisionStats::new());

    // Keep server alive - variable intentionally unused except for Drop
    let _status_server = match StatusServer::start(None, DEFAULT_STATUS_PORT, stats.clone()) {
        Ok(server) => Some(server),
        Err(e) => {
            warn!("Failed to start status server: {}", e);
            warn!("Continuing without status server");
            None
        }
    };

    let (tx, rx) = event_channel();
    let stack = LoopbackStack::new(tx.clone());
    let connector = NmcliConnector::new(tx.clone(), config.connect_timeout);
    let server = ProvisionServer::new(stack, connector, config, tx.clone(), stats);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(signal) => {
                info!("{} received, shutting down", signal);
                shutdown.cancel();
            }
            Err(e) => error!("Failed to listen for termination signals: {}", e),
        }
    });

    // The loopback stack has no adapter to report power state, so seed it.
    if tx
        .send(Event::Adapter(AdapterEvent::StateChange(
            AdapterState::PoweredOn,
        )))
        .await
        .is_err()
    {
        error!("Event loop unavailable at startup");
        std::process::exit(1);
    }

    server.run(rx, cancel).await;

    info!("=== SmartWardrobe BLE Server stopped ===");
}
