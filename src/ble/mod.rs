//! BLE peripheral plumbing.
//!
//! # Components
//!
//! - [`adapter`] - adapter states, stack events/commands, the [`adapter::RadioStack`] seam
//! - [`lifecycle`] - pure state machine over registration, advertising, reconnection
//! - [`reassembly`] - fragmented characteristic-write reassembly
//! - [`reconnect`] - debounced one-shot timers
//! - [`loopback`] - command-echoing stack for host bring-up

pub mod adapter;
pub mod lifecycle;
pub mod loopback;
pub mod reassembly;
pub mod reconnect;

pub use adapter::{AdapterCommand, AdapterEvent, AdapterState, RadioStack, ServiceDescriptor};
pub use lifecycle::{Action, LifecycleEvent, LifecycleManager, Timings, ADVERTISED_NAME_MAX};
pub use loopback::LoopbackStack;
pub use reassembly::{WriteOutcome, WriteReassembler, DEFAULT_WRITE_UNIT};
pub use reconnect::{fire_after, ReconnectScheduler};
