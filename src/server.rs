//! Provisioning peripheral event loop.
//!
//! Single-task owner of all peripheral state: the lifecycle machine, the
//! write reassembler, the device-info payload, and the reconnect timer. All
//! inputs arrive as [`Event`]s over one channel; stack glue, characteristic
//! handlers, and timers are just senders. The loop itself never blocks on
//! anything but the channel, so ordering between adapter events and
//! characteristic traffic is total.

use crate::ble::adapter::{AdapterEvent, RadioStack, ServiceDescriptor};
use crate::ble::lifecycle::{Action, LifecycleEvent, LifecycleManager, Timings};
use crate::ble::reassembly::{WriteOutcome, WriteReassembler};
use crate::ble::reconnect::{fire_after, ReconnectScheduler};
use crate::device::DeviceIdentity;
use crate::device_info::{DeviceInfoProvider, ReadError};
use crate::status::ProvisionStats;
use crate::wifi::config::{parse_payload, WifiConfigRecord};
use crate::wifi::connect::{self, ConnectOutcome};
use crate::wifi::storage::save_config;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Depth of the event channel.
pub const EVENT_QUEUE_DEPTH: usize = 64;

/// GATT-level status returned to a characteristic write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Fragment accepted, or full payload accepted and persisted.
    Success,
    /// A logical write is already being assembled.
    Busy,
    /// Reassembled payload failed parsing or validation.
    Malformed,
    /// Fragment offset does not continue the assembly.
    InvalidOffset,
    /// Payload was valid but could not be persisted.
    Failed,
}

/// Everything the event loop reacts to.
#[derive(Debug)]
pub enum Event {
    /// Raised by the radio stack glue.
    Adapter(AdapterEvent),
    /// Power-on settle delay elapsed.
    SettleElapsed,
    /// Registration retry backoff elapsed.
    RetryElapsed,
    /// Debounced reconnect timer fired.
    ReconnectElapsed,
    /// One fragment of a Wi-Fi characteristic write.
    WifiWrite {
        data: Vec<u8>,
        offset: usize,
        without_response: bool,
        /// Write-with-response status channel; `None` for fire-and-forget.
        respond: Option<oneshot::Sender<WriteStatus>>,
    },
    /// Device-info characteristic read at an offset.
    InfoRead {
        offset: usize,
        respond: oneshot::Sender<Result<Vec<u8>, ReadError>>,
    },
    /// A spawned connect attempt finished.
    ConnectFinished(ConnectOutcome),
    /// Stop the loop after tearing services down.
    Shutdown,
}

impl From<AdapterEvent> for Event {
    fn from(event: AdapterEvent) -> Self {
        Self::Adapter(event)
    }
}

/// Seam for the external network join, alongside [`RadioStack`].
///
/// Called once per accepted payload with the parsed credentials. The join
/// runs in the background; implementations report back (if at all) as an
/// [`Event::ConnectFinished`].
pub trait WifiConnector {
    /// Start a join attempt with these credentials.
    fn start_join(&mut self, ssid: &str, password: &str);
}

/// Production connector: spawns an nmcli attempt and feeds the outcome back
/// into the event loop.
#[derive(Debug)]
pub struct NmcliConnector {
    tx: mpsc::Sender<Event>,
    timeout: Duration,
}

impl NmcliConnector {
    /// Create a connector reporting outcomes into `tx`.
    pub fn new(tx: mpsc::Sender<Event>, timeout: Duration) -> Self {
        Self { tx, timeout }
    }
}

impl WifiConnector for NmcliConnector {
    fn start_join(&mut self, ssid: &str, password: &str) {
        let tx = self.tx.clone();
        let ssid = ssid.to_string();
        let password = password.to_string();
        let timeout = self.timeout;
        tokio::spawn(async move {
            let outcome = connect::connect(&ssid, &password, timeout).await;
            let _ = tx.send(Event::ConnectFinished(outcome)).await;
        });
    }
}

/// Wait for a termination signal.
///
/// Resolves on SIGINT (Ctrl+C) or SIGTERM with the name of the signal that
/// arrived, so the caller can log it before cancelling the loop.
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}

/// Static configuration for the peripheral.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Canonical config file path.
    pub config_path: PathBuf,
    /// Local device identity.
    pub identity: DeviceIdentity,
    /// Lifecycle timer delays.
    pub timings: Timings,
    /// Bound on a single nmcli connect attempt.
    pub connect_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_path: crate::wifi::storage::default_config_path(),
            identity: DeviceIdentity::default(),
            timings: Timings::default(),
            connect_timeout: connect::CONNECT_TIMEOUT,
        }
    }
}

/// The provisioning peripheral.
///
/// Generic over the radio stack and the network-join trigger so tests can
/// drive it with recording fakes and hosts without an adapter with a
/// loopback stack.
pub struct ProvisionServer<S: RadioStack, C: WifiConnector> {
    stack: S,
    connector: C,
    lifecycle: LifecycleManager,
    reassembler: WriteReassembler,
    device_info: DeviceInfoProvider,
    reconnect: ReconnectScheduler<Event>,
    tx: mpsc::Sender<Event>,
    config_path: PathBuf,
    identity: DeviceIdentity,
    stats: Arc<ProvisionStats>,
}

/// Create the event channel the server and its input sources share.
pub fn event_channel() -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
    mpsc::channel(EVENT_QUEUE_DEPTH)
}

impl<S: RadioStack, C: WifiConnector> ProvisionServer<S, C> {
    /// Build a server around `stack` and `connector`, sending self-addressed
    /// timer events through `tx`.
    pub fn new(
        stack: S,
        connector: C,
        config: ServerConfig,
        tx: mpsc::Sender<Event>,
        stats: Arc<ProvisionStats>,
    ) -> Self {
        let lifecycle = LifecycleManager::new(
            &config.identity.name,
            ServiceDescriptor::provisioning(),
            config.timings.clone(),
        );
        Self {
            stack,
            connector,
            lifecycle,
            reassembler: WriteReassembler::new(),
            device_info: DeviceInfoProvider::new(&config.identity),
            reconnect: ReconnectScheduler::new(tx.clone()),
            tx,
            config_path: config.config_path,
            identity: config.identity,
            stats,
        }
    }

    /// Run until cancelled, the channel closes, or a [`Event::Shutdown`]
    /// arrives.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Event>, cancel: CancellationToken) {
        info!(
            "Provisioning server running, advertising as {:?}",
            self.lifecycle.advertised_name()
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Cancellation requested");
                    self.teardown();
                    break;
                }
                maybe = rx.recv() => match maybe {
                    Some(event) => {
                        if !self.handle_event(event) {
                            break;
                        }
                    }
                    None => {
                        warn!("Event channel closed");
                        self.teardown();
                        break;
                    }
                }
            }
        }
        info!("Provisioning server stopped");
    }

    /// Apply one event. Returns `false` when the loop should stop.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Adapter(adapter_event) => {
                self.pre_lifecycle(&adapter_event);
                let actions = self
                    .lifecycle
                    .handle(LifecycleEvent::Adapter(adapter_event));
                self.execute(actions);
                self.sync_stats();
            }
            Event::SettleElapsed => {
                let actions = self.lifecycle.handle(LifecycleEvent::SettleElapsed);
                self.execute(actions);
            }
            Event::RetryElapsed => {
                let actions = self.lifecycle.handle(LifecycleEvent::RetryElapsed);
                self.execute(actions);
            }
            Event::ReconnectElapsed => {
                let actions = self.lifecycle.handle(LifecycleEvent::ReconnectElapsed);
                self.execute(actions);
                self.sync_stats();
            }
            Event::WifiWrite {
                data,
                offset,
                without_response,
                respond,
            } => {
                let status = self.on_wifi_write(&data, offset, without_response);
                if let Some(respond) = respond {
                    let _ = respond.send(status);
                }
            }
            Event::InfoRead { offset, respond } => {
                self.stats.info_reads.fetch_add(1, Ordering::Relaxed);
                let result = self.device_info.read_at(offset).map(<[u8]>::to_vec);
                if let Err(ref e) = result {
                    warn!("Device info read rejected: {}", e);
                }
                let _ = respond.send(result);
            }
            Event::ConnectFinished(outcome) => match outcome {
                ConnectOutcome::Success { .. } => info!("WiFi join finished: {}", outcome),
                _ => warn!("WiFi join finished: {}", outcome),
            },
            Event::Shutdown => {
                info!("Shutdown requested");
                self.teardown();
                return false;
            }
        }
        true
    }

    /// State the lifecycle machine does not own but that must track adapter
    /// events: the reassembler and the stats counters.
    fn pre_lifecycle(&mut self, event: &AdapterEvent) {
        match event {
            AdapterEvent::StateChange(state) => {
                self.stats.set_adapter_state(*state);
                if !state.is_powered_on() {
                    self.reassembler.reset();
                }
            }
            AdapterEvent::Disconnect { .. } => {
                // A client that vanished mid-payload must not wedge the
                // characteristic for the next one.
                self.reassembler.reset();
            }
            AdapterEvent::MtuChange { mtu, .. } => {
                self.reassembler.update_mtu(*mtu);
            }
            _ => {}
        }
    }

    fn execute(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Stack(command) => self.stack.submit(command),
                Action::ArmSettle(delay) => {
                    fire_after(self.tx.clone(), delay, Event::SettleElapsed)
                }
                Action::ArmRetry(delay) => fire_after(self.tx.clone(), delay, Event::RetryElapsed),
                Action::ArmReconnect(delay) => {
                    self.reconnect.schedule(delay, Event::ReconnectElapsed)
                }
                Action::CancelReconnect => self.reconnect.cancel(),
            }
        }
    }

    fn sync_stats(&self) {
        self.stats
            .advertising
            .store(self.lifecycle.is_advertising(), Ordering::Relaxed);
        self.stats
            .connected
            .store(self.lifecycle.is_connected(), Ordering::Relaxed);
    }

    fn on_wifi_write(&mut self, data: &[u8], offset: usize, without_response: bool) -> WriteStatus {
        match self.reassembler.on_write(data, offset, without_response) {
            WriteOutcome::Partial => WriteStatus::Success,
            WriteOutcome::RejectedBusy => {
                self.stats.writes_rejected.fetch_add(1, Ordering::Relaxed);
                WriteStatus::Busy
            }
            WriteOutcome::InvalidOffset => {
                self.stats.writes_rejected.fetch_add(1, Ordering::Relaxed);
                WriteStatus::InvalidOffset
            }
            WriteOutcome::Complete(payload) => self.on_payload_complete(&payload),
        }
    }

    /// A full logical payload arrived: parse, persist, trigger the join.
    fn on_payload_complete(&mut self, payload: &[u8]) -> WriteStatus {
        let request = match parse_payload(payload) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected provisioning payload: {}", e);
                self.stats.writes_rejected.fetch_add(1, Ordering::Relaxed);
                return WriteStatus::Malformed;
            }
        };
        info!("WiFi credentials received for SSID: {}", request.ssid);

        let record = WifiConfigRecord::new(&request, &self.identity);
        if let Err(e) = save_config(&self.config_path, &record) {
            error!("Failed to save config: {}", e);
            self.stats.writes_rejected.fetch_add(1, Ordering::Relaxed);
            return WriteStatus::Failed;
        }

        self.stats.writes_accepted.fetch_add(1, Ordering::Relaxed);
        self.stats.config_received.store(true, Ordering::Relaxed);

        // Fire and forget: the write is acknowledged now, the join result
        // comes back later as an event and is only logged.
        self.connector.start_join(&request.ssid, &request.password);

        WriteStatus::Success
    }

    fn teardown(&mut self) {
        let actions = self.lifecycle.stop_services();
        self.execute(actions);
        self.reassembler.reset();
        self.sync_stats();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::adapter::{AdapterCommand, AdapterState};
    use std::env;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn unique_config_path() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        env::temp_dir().join(format!(
            "wardrobe-server-test-{}-{}.json",
            std::process::id(),
            id
        ))
    }

    /// Radio stack that records every submitted command.
    #[derive(Clone, Default)]
    struct RecordingStack {
        commands: Arc<Mutex<Vec<AdapterCommand>>>,
    }

    impl RecordingStack {
        fn commands(&self) -> Vec<AdapterCommand> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl RadioStack for RecordingStack {
        fn submit(&mut self, command: AdapterCommand) {
            self.commands.lock().unwrap().push(command);
        }
    }

    /// Connector that records join attempts instead of shelling out.
    #[derive(Clone, Default)]
    struct RecordingConnector {
        attempts: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl RecordingConnector {
        fn attempts(&self) -> Vec<(String, String)> {
            self.attempts.lock().unwrap().clone()
        }
    }

    impl WifiConnector for RecordingConnector {
        fn start_join(&mut self, ssid: &str, password: &str) {
            self.attempts
                .lock()
                .unwrap()
                .push((ssid.to_string(), password.to_string()));
        }
    }

    fn test_server(
        config_path: PathBuf,
    ) -> (
        ProvisionServer<RecordingStack, RecordingConnector>,
        RecordingStack,
        RecordingConnector,
        mpsc::Receiver<Event>,
        Arc<ProvisionStats>,
    ) {
        let stack = RecordingStack::default();
        let connector = RecordingConnector::default();
        let (tx, rx) = event_channel();
        let stats = Arc::new(ProvisionStats::new());
        let config = ServerConfig {
            config_path,
            connect_timeout: Duration::from_millis(200),
            ..ServerConfig::default()
        };
        let server = ProvisionServer::new(
            stack.clone(),
            connector.clone(),
            config,
            tx,
            stats.clone(),
        );
        (server, stack, connector, rx, stats)
    }

    /// Drive the server to registered-and-advertising with a connected client.
    fn bring_up(server: &mut ProvisionServer<RecordingStack, RecordingConnector>) {
        server.handle_event(Event::Adapter(AdapterEvent::StateChange(
            AdapterState::PoweredOn,
        )));
        server.handle_event(Event::SettleElapsed);
        server.handle_event(Event::Adapter(AdapterEvent::ServicesSet { error: None }));
        server.handle_event(Event::Adapter(AdapterEvent::AdvertisingStart {
            error: None,
        }));
        server.handle_event(Event::Adapter(AdapterEvent::Accept {
            client: "aa:bb".to_string(),
        }));
    }

    fn write_event(data: &[u8], offset: usize) -> (Event, oneshot::Receiver<WriteStatus>) {
        let (tx, rx) = oneshot::channel();
        (
            Event::WifiWrite {
                data: data.to_vec(),
                offset,
                without_response: false,
                respond: Some(tx),
            },
            rx,
        )
    }

    /// A whole payload in one write-without-response, as phone apps send it.
    fn write_once_event(data: &[u8]) -> (Event, oneshot::Receiver<WriteStatus>) {
        let (tx, rx) = oneshot::channel();
        (
            Event::WifiWrite {
                data: data.to_vec(),
                offset: 0,
                without_response: true,
                respond: Some(tx),
            },
            rx,
        )
    }

    // ==================== Lifecycle Wiring Tests ====================

    #[tokio::test]
    async fn test_bring_up_issues_stack_commands() {
        let (mut server, stack, _connector, _rx, stats) = test_server(unique_config_path());
        bring_up(&mut server);

        let commands = stack.commands();
        assert!(matches!(commands[0], AdapterCommand::RegisterServices(_)));
        assert!(matches!(
            commands[1],
            AdapterCommand::StartAdvertising { .. }
        ));
        assert_eq!(stats.adapter_state(), AdapterState::PoweredOn);
        assert!(stats.connected.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_shutdown_event_stops_loop_and_tears_down() {
        let (mut server, stack, _connector, _rx, _stats) = test_server(unique_config_path());
        bring_up(&mut server);

        assert!(!server.handle_event(Event::Shutdown));
        let commands = stack.commands();
        assert_eq!(commands[commands.len() - 2], AdapterCommand::StopAdvertising);
        assert_eq!(commands[commands.len() - 1], AdapterCommand::ClearServices);
    }

    #[tokio::test]
    async fn test_run_loop_with_loopback_reaches_advertising() {
        let (tx, rx) = event_channel();
        let stats = Arc::new(ProvisionStats::new());
        let stack = crate::ble::loopback::LoopbackStack::new(tx.clone());
        let config = ServerConfig {
            config_path: unique_config_path(),
            timings: Timings {
                settle_delay: Duration::from_millis(1),
                ..Timings::default()
            },
            ..ServerConfig::default()
        };
        let server = ProvisionServer::new(
            stack,
            RecordingConnector::default(),
            config,
            tx.clone(),
            stats.clone(),
        );

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(server.run(rx, cancel.clone()));

        tx.send(Event::Adapter(AdapterEvent::StateChange(
            AdapterState::PoweredOn,
        )))
        .await
        .unwrap();

        // Settle, register, advertise, all through the loopback echo.
        tokio::time::timeout(Duration::from_secs(2), async {
            while !stats.advertising.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("never reached advertising");

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sigterm_resolves_shutdown_signal() {
        let wait = tokio::spawn(shutdown_signal());
        // Let the spawned task install its handlers before signalling.
        tokio::time::sleep(Duration::from_millis(100)).await;

        std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .expect("kill failed");

        let signal = tokio::time::timeout(Duration::from_secs(2), wait)
            .await
            .expect("signal never observed")
            .unwrap()
            .unwrap();
        assert_eq!(signal, "SIGTERM");
    }

    // ==================== Write Path Tests ====================

    #[tokio::test]
    async fn test_json_write_persists_record() {
        let path = unique_config_path();
        let (mut server, _stack, connector, _rx, stats) = test_server(path.clone());
        bring_up(&mut server);

        let (event, status) = write_once_event(br#"{"ssid":"Home","password":"secret"}"#);
        server.handle_event(event);
        assert_eq!(status.await.unwrap(), WriteStatus::Success);

        let record = crate::wifi::storage::load_config(&path).expect("config not written");
        assert_eq!(record.ssid, "Home");
        assert_eq!(record.password, "secret");
        assert_eq!(record.device_mac, "2c:cf:67:c6:97:2c");
        assert_eq!(record.device_serial, "0001");
        assert_eq!(stats.writes_accepted.load(Ordering::Relaxed), 1);
        assert!(stats.config_received.load(Ordering::Relaxed));

        // The join trigger carries exactly the parsed credentials.
        assert_eq!(
            connector.attempts(),
            vec![("Home".to_string(), "secret".to_string())]
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_join_trigger_carries_positional_credentials() {
        let path = unique_config_path();
        let (mut server, _stack, connector, _rx, _stats) = test_server(path.clone());
        bring_up(&mut server);

        let (event, status) = write_event(b"Cellar;hunter2", 0);
        server.handle_event(event);
        assert_eq!(status.await.unwrap(), WriteStatus::Success);
        assert_eq!(
            connector.attempts(),
            vec![("Cellar".to_string(), "hunter2".to_string())]
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_fragmented_write_persists_record() {
        let path = unique_config_path();
        let (mut server, _stack, _connector, _rx, _stats) = test_server(path.clone());
        bring_up(&mut server);

        let payload = br#"{"ssid":"LongNetworkName","password":"correct horse battery"}"#;
        let mut offset = 0;
        while offset < payload.len() {
            let end = (offset + 20).min(payload.len());
            let (event, status) = write_event(&payload[offset..end], offset);
            server.handle_event(event);
            assert_eq!(status.await.unwrap(), WriteStatus::Success);
            offset = end;
        }

        let record = crate::wifi::storage::load_config(&path).expect("config not written");
        assert_eq!(record.ssid, "LongNetworkName");

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_busy_write_rejected_and_file_untouched() {
        let path = unique_config_path();
        let (mut server, _stack, connector, _rx, stats) = test_server(path.clone());
        bring_up(&mut server);

        // First fragment of a logical write keeps the characteristic busy.
        let (event, status) = write_event(&[b'x'; 20], 0);
        server.handle_event(event);
        assert_eq!(status.await.unwrap(), WriteStatus::Success);

        let (event, status) = write_event(br#"{"ssid":"A","password":"b"}"#, 0);
        server.handle_event(event);
        assert_eq!(status.await.unwrap(), WriteStatus::Busy);
        assert!(!path.exists());
        assert_eq!(stats.writes_rejected.load(Ordering::Relaxed), 1);
        assert!(connector.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_rejected() {
        let path = unique_config_path();
        let (mut server, _stack, connector, _rx, stats) = test_server(path.clone());
        bring_up(&mut server);

        let (event, status) = write_event(br#"{"ssid":"Home"}"#, 0);
        server.handle_event(event);
        assert_eq!(status.await.unwrap(), WriteStatus::Malformed);
        assert!(!path.exists());
        assert_eq!(stats.writes_rejected.load(Ordering::Relaxed), 1);
        assert_eq!(stats.writes_accepted.load(Ordering::Relaxed), 0);
        assert!(connector.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_offset_rejected() {
        let (mut server, _stack, _connector, _rx, _stats) = test_server(unique_config_path());
        bring_up(&mut server);

        let (event, status) = write_event(b"tail", 40);
        server.handle_event(event);
        assert_eq!(status.await.unwrap(), WriteStatus::InvalidOffset);
    }

    #[tokio::test]
    async fn test_disconnect_resets_partial_assembly() {
        let path = unique_config_path();
        let (mut server, _stack, _connector, _rx, _stats) = test_server(path.clone());
        bring_up(&mut server);

        let (event, status) = write_event(&[b'x'; 20], 0);
        server.handle_event(event);
        assert_eq!(status.await.unwrap(), WriteStatus::Success);
        assert!(server.reassembler.is_busy());

        server.handle_event(Event::Adapter(AdapterEvent::Disconnect {
            client: "aa:bb".to_string(),
        }));
        assert!(!server.reassembler.is_busy());

        // Next client starts clean.
        server.handle_event(Event::Adapter(AdapterEvent::Accept {
            client: "cc:dd".to_string(),
        }));
        let (event, status) = write_once_event(br#"{"ssid":"Home","password":"pw"}"#);
        server.handle_event(event);
        assert_eq!(status.await.unwrap(), WriteStatus::Success);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_mtu_change_adjusts_write_unit() {
        let (mut server, _stack, _connector, _rx, _stats) = test_server(unique_config_path());
        bring_up(&mut server);

        server.handle_event(Event::Adapter(AdapterEvent::MtuChange {
            mtu: 185,
            client: Some("aa:bb".to_string()),
        }));
        assert_eq!(server.reassembler.write_unit(), 182);
    }

    // ==================== Read Path Tests ====================

    #[tokio::test]
    async fn test_info_read_returns_chunk_and_counts() {
        let (mut server, _stack, _connector, _rx, stats) = test_server(unique_config_path());
        bring_up(&mut server);

        let (tx, rx) = oneshot::channel();
        server.handle_event(Event::InfoRead {
            offset: 0,
            respond: tx,
        });
        let payload = rx.await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["deviceName"], "SmartWardrobe");
        assert_eq!(stats.info_reads.load(Ordering::Relaxed), 1);

        let (tx, rx) = oneshot::channel();
        server.handle_event(Event::InfoRead {
            offset: payload.len() + 1,
            respond: tx,
        });
        assert!(rx.await.unwrap().is_err());
    }
}
