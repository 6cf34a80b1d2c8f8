//! Inbound ports (API) for the gossip switch.

use crate::domain::{PortId, SwitchMessage};
use crate::errors::{FilterError, SwitchError};
use crate::port::{InPort, OutPort};
use std::sync::Arc;

/// Public switch API.
pub trait GossipSwitchApi: Send + Sync {
    /// In port by id, `None` if there is no such port.
    fn in_port(&self, id: PortId) -> Option<Arc<InPort>>;

    /// Out port by id, `None` if there is no such port.
    fn out_port(&self, id: PortId) -> Option<Arc<OutPort>>;

    /// Begin receiving from every in port and broadcasting to every out port.
    ///
    /// Fails with [`SwitchError::AlreadyStarted`] if running.
    fn start(&self) -> Result<(), SwitchError>;

    /// Stop receiving. Fails with [`SwitchError::AlreadyStopped`] if stopped.
    fn stop(&self) -> Result<(), SwitchError>;

    /// True between a successful `start` and the next successful `stop`.
    fn is_running(&self) -> bool;
}

/// Validator plugged into the switch.
///
/// Only messages for which `verify` returns `Ok` are broadcast. The filter
/// may rewrite the message (the block filter fills in an unassigned
/// receipts root).
pub trait SwitchFilter: Send + Sync {
    fn verify(&self, port: PortId, msg: &mut SwitchMessage) -> Result<(), FilterError>;
}
