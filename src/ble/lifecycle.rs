//! Adapter lifecycle state machine.
//!
//! Drives service registration, advertising, and reconnection from radio
//! stack events. The machine is pure: every transition is a function of
//! (current state, event) producing a list of [`Action`]s for the event loop
//! to execute, so it can be tested without a radio stack or clocks.
//!
//! Registration failures are retried on a fixed backoff while the adapter
//! stays powered on. Advertising failures are logged and left to the next
//! adapter event. Repeated `start_services` entries while already running
//! are no-ops, so the machine is convergent under event churn.

use super::adapter::{AdapterCommand, AdapterEvent, AdapterState, ServiceDescriptor};
use log::{debug, info, warn};
use std::time::Duration;

/// Advertising names are truncated to this many characters to stay inside
/// link-layer advertising payload limits.
pub const ADVERTISED_NAME_MAX: usize = 8;

/// Timer delays used by the lifecycle machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    /// Delay after power-on before registering services, letting the stack settle.
    pub settle_delay: Duration,
    /// Backoff before retrying a failed service registration.
    pub register_retry: Duration,
    /// Debounce delay before restarting advertising after a disconnect.
    pub reconnect_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            register_retry: Duration::from_secs(2),
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

/// Event consumed by the lifecycle machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Event raised by the radio stack.
    Adapter(AdapterEvent),
    /// Power-on settle delay elapsed.
    SettleElapsed,
    /// Registration retry backoff elapsed.
    RetryElapsed,
    /// Reconnect debounce timer fired.
    ReconnectElapsed,
}

/// Effect requested by a lifecycle transition.
///
/// Stack commands go to the [`super::adapter::RadioStack`]; timer actions are
/// executed by the event loop (the reconnect timer is the only cancellable
/// one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Issue a command to the radio stack.
    Stack(AdapterCommand),
    /// Arm the one-shot power-on settle timer.
    ArmSettle(Duration),
    /// Arm the one-shot registration retry timer.
    ArmRetry(Duration),
    /// Arm (or re-arm) the debounced reconnect timer.
    ArmReconnect(Duration),
    /// Cancel any pending reconnect timer.
    CancelReconnect,
}

/// Snapshot of the runtime flags, for logging and the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSnapshot {
    pub adapter_state: AdapterState,
    pub services_registered: bool,
    pub advertising: bool,
    pub connected: bool,
    pub client: Option<String>,
}

/// State machine over adapter power state and service runtime state.
#[derive(Debug)]
pub struct LifecycleManager {
    adapter_state: AdapterState,
    services_registered: bool,
    advertising: bool,
    connected: bool,
    client: Option<String>,
    descriptor: ServiceDescriptor,
    advertised_name: String,
    timings: Timings,
}

impl LifecycleManager {
    /// Create a lifecycle manager advertising `name` (truncated to
    /// [`ADVERTISED_NAME_MAX`] characters) for the given service.
    pub fn new(name: &str, descriptor: ServiceDescriptor, timings: Timings) -> Self {
        Self {
            adapter_state: AdapterState::Unknown,
            services_registered: false,
            advertising: false,
            connected: false,
            client: None,
            descriptor,
            advertised_name: truncate_name(name),
            timings,
        }
    }

    /// Current adapter power state.
    pub fn adapter_state(&self) -> AdapterState {
        self.adapter_state
    }

    /// Whether the peripheral is currently advertising.
    pub fn is_advertising(&self) -> bool {
        self.advertising
    }

    /// Whether a central is connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Name used in advertising packets.
    pub fn advertised_name(&self) -> &str {
        &self.advertised_name
    }

    /// Snapshot of all runtime flags.
    pub fn snapshot(&self) -> RuntimeSnapshot {
        RuntimeSnapshot {
            adapter_state: self.adapter_state,
            services_registered: self.services_registered,
            advertising: self.advertising,
            connected: self.connected,
            client: self.client.clone(),
        }
    }

    /// Apply one event and return the effects to execute.
    pub fn handle(&mut self, event: LifecycleEvent) -> Vec<Action> {
        match event {
            LifecycleEvent::Adapter(ev) => self.handle_adapter_event(ev),
            LifecycleEvent::SettleElapsed => {
                if self.adapter_state.is_powered_on() {
                    self.start_services()
                } else {
                    debug!("Settle timer fired but adapter is {}", self.adapter_state);
                    Vec::new()
                }
            }
            LifecycleEvent::RetryElapsed => {
                if self.adapter_state.is_powered_on() {
                    info!("Retrying service registration");
                    self.start_services()
                } else {
                    debug!("Retry timer fired but adapter is {}", self.adapter_state);
                    Vec::new()
                }
            }
            LifecycleEvent::ReconnectElapsed => {
                if self.adapter_state.is_powered_on() && !self.advertising && !self.connected {
                    info!("Restarting services after disconnect");
                    self.start_services()
                } else {
                    debug!(
                        "Reconnect timer fired but nothing to do (state={}, advertising={}, connected={})",
                        self.adapter_state, self.advertising, self.connected
                    );
                    Vec::new()
                }
            }
        }
    }

    fn handle_adapter_event(&mut self, event: AdapterEvent) -> Vec<Action> {
        match event {
            AdapterEvent::StateChange(new_state) => {
                info!(
                    "Adapter state changed: {} -> {}",
                    self.adapter_state, new_state
                );
                self.adapter_state = new_state;
                if new_state.is_powered_on() {
                    vec![Action::ArmSettle(self.timings.settle_delay)]
                } else {
                    self.stop_services()
                }
            }

            AdapterEvent::ServicesSet { error: Some(err) } => {
                warn!("Service registration failed: {}", err);
                self.services_registered = false;
                vec![Action::ArmRetry(self.timings.register_retry)]
            }

            AdapterEvent::ServicesSet { error: None } => {
                info!("Services registered");
                self.services_registered = true;
                if !self.advertising {
                    info!("Starting advertising as {:?}", self.advertised_name);
                    vec![Action::Stack(AdapterCommand::StartAdvertising {
                        name: self.advertised_name.clone(),
                        service_uuids: vec![self.descriptor.uuid.clone()],
                    })]
                } else {
                    Vec::new()
                }
            }

            AdapterEvent::AdvertisingStart { error: Some(err) } => {
                // Not retried automatically; the next adapter event re-enters
                // start_services.
                warn!("Advertising start failed: {}", err);
                self.advertising = false;
                Vec::new()
            }

            AdapterEvent::AdvertisingStart { error: None } => {
                if self.adapter_state.is_powered_on() && self.services_registered {
                    info!("Advertising started");
                    self.advertising = true;
                    Vec::new()
                } else {
                    // Stale result: services were torn down while the request
                    // was in flight.
                    warn!("Advertising started after teardown, stopping");
                    vec![Action::Stack(AdapterCommand::StopAdvertising)]
                }
            }

            AdapterEvent::AdvertisingStop => {
                info!("Advertising stopped");
                self.advertising = false;
                Vec::new()
            }

            AdapterEvent::Accept { client } => {
                info!("Client connected: {}", client);
                self.connected = true;
                self.client = Some(client);
                // A live connection supersedes any scheduled restart.
                vec![Action::CancelReconnect]
            }

            AdapterEvent::Disconnect { client } => {
                info!("Client disconnected: {}", client);
                self.connected = false;
                self.client = None;
                vec![Action::ArmReconnect(self.timings.reconnect_delay)]
            }

            AdapterEvent::MtuChange { mtu, client } => {
                info!("MTU changed to {} for client {:?}", mtu, client);
                Vec::new()
            }
        }
    }

    /// Register services and start advertising if not already running.
    ///
    /// No-op unless the adapter is powered on; no-op when services are
    /// registered and advertising is active.
    fn start_services(&mut self) -> Vec<Action> {
        if !self.adapter_state.is_powered_on() {
            warn!("Adapter not ready, state: {}", self.adapter_state);
            return Vec::new();
        }
        if self.services_registered && self.advertising {
            debug!("Services already running");
            return Vec::new();
        }
        info!("Registering GATT services");
        vec![Action::Stack(AdapterCommand::RegisterServices(
            self.descriptor.clone(),
        ))]
    }

    /// Idempotently tear down services.
    ///
    /// Clears all runtime flags, cancels any pending reconnect timer, then
    /// asks the stack to stop advertising and clear services.
    pub fn stop_services(&mut self) -> Vec<Action> {
        info!("Stopping services");
        self.advertising = false;
        self.services_registered = false;
        self.connected = false;
        self.client = None;
        vec![
            Action::CancelReconnect,
            Action::Stack(AdapterCommand::StopAdvertising),
            Action::Stack(AdapterCommand::ClearServices),
        ]
    }
}

/// Truncate a device name to [`ADVERTISED_NAME_MAX`] characters, respecting
/// UTF-8 boundaries.
fn truncate_name(name: &str) -> String {
    name.chars().take(ADVERTISED_NAME_MAX).collect()
}
