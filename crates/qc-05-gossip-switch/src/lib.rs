//! # Gossip Switch Subsystem (qc-05)
//!
//! Routes blocks and transactions from in ports to out ports, broadcasting
//! only what a pluggable filter accepts.
//!
//! ## Architecture Role
//!
//! ```text
//! [Local producer] ──→ LocalIn (0)  ─┐                      ┌─→ LocalOut (0)  ──→ [Local consumers]
//!                                    ├─→ [TxFilter |        │
//! [Peers]          ──→ RemoteIn (1) ─┘    BlockFilter] ─ok──┴─→ RemoteOut (1) ──→ [Peers]
//! ```
//!
//! ## Filters
//!
//! - **Transaction switch**: declared sender must match the recovered signer.
//! - **Block switch**: header hash, parent linkage, tx root, transaction
//!   replay, receipts root, state root and mix digest are checked by a
//!   [`filter::Worker`]; valid blocks are written to the chain.
//!
//! Verdicts are reported through an [`ports::EventSink`].
//!
//! ## Usage
//!
//! ```no_run
//! use qc_05_gossip_switch::{Collaborators, GossipSwitch, SwitchConfig, LOCAL_IN_PORT_ID};
//! use shared_bus::InMemoryEventBus;
//! use shared_types::Transaction;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = Arc::new(InMemoryEventBus::new());
//! let switch = GossipSwitch::by_type(&SwitchConfig::from_env()?, Collaborators::new(bus))?;
//! switch.start()?;
//! if let Some(port) = switch.in_port(LOCAL_IN_PORT_ID) {
//!     port.write(Transaction::default())?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod port;
pub mod ports;
pub mod service;

pub use config::{SwitchConfig, SwitchType};
pub use domain::*;
pub use errors::*;
pub use filter::{BlockFilter, TxFilter, Worker, WorkerOptions};
pub use port::{InPort, InPortReader, OutPort, OutputError, OutputFn};
pub use ports::inbound::{GossipSwitchApi, SwitchFilter};
pub use service::{Collaborators, GossipSwitch};
