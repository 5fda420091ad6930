//! Loopback radio stack for host bring-up.
//!
//! Answers every command with its success event, so the full lifecycle can
//! be exercised end to end on a development host without a Bluetooth
//! adapter. Real stack glue implements [`RadioStack`] the same way, feeding
//! genuine adapter events into the same channel.

use super::adapter::{AdapterCommand, AdapterEvent, RadioStack};
use log::{debug, info};
use tokio::sync::mpsc;

/// Radio stack that immediately acknowledges every command.
#[derive(Debug)]
pub struct LoopbackStack<E> {
    tx: mpsc::Sender<E>,
}

impl<E> LoopbackStack<E> {
    /// Create a loopback stack echoing events into `tx`.
    pub fn new(tx: mpsc::Sender<E>) -> Self {
        Self { tx }
    }
}

impl<E: From<AdapterEvent> + Send + 'static> RadioStack for LoopbackStack<E> {
    fn submit(&mut self, command: AdapterCommand) {
        debug!("Loopback stack received {:?}", command);
        let reply = match command {
            AdapterCommand::RegisterServices(descriptor) => {
                info!("Loopback: registered service {}", descriptor.uuid);
                Some(AdapterEvent::ServicesSet { error: None })
            }
            AdapterCommand::ClearServices => None,
            AdapterCommand::StartAdvertising { name, .. } => {
                info!("Loopback: advertising as {:?}", name);
                Some(AdapterEvent::AdvertisingStart { error: None })
            }
            AdapterCommand::StopAdvertising => Some(AdapterEvent::AdvertisingStop),
        };
        if let Some(event) = reply {
            // Queue full or loop gone: drop the echo, the machine converges
            // on the next real event.
            let _ = self.tx.try_send(event.into());
        }
    }
}
