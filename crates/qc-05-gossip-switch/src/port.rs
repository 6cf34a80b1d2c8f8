//! # Switch Ports
//!
//! - [`InPort`]: unbounded FIFO ingress. Producers `write`, the switch's
//!   receive loop holds the port's [`InPortReader`] for as long as it runs.
//! - [`OutPort`]: ordered list of bound output functions. `write` calls
//!   each of them in binding order while holding the port lock, so two
//!   messages never interleave within one port.

use crate::domain::{PortId, SwitchMessage};
use crate::errors::PortError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{debug, info, warn};

/// Error type returned by output functions.
pub type OutputError = Box<dyn std::error::Error + Send + Sync>;

/// A subscriber bound to an [`OutPort`].
pub type OutputFn = Box<dyn Fn(&SwitchMessage) -> Result<(), OutputError> + Send + Sync>;

/// Switch ingress port.
pub struct InPort {
    id: PortId,
    sender: mpsc::UnboundedSender<SwitchMessage>,
    receiver: AsyncMutex<mpsc::UnboundedReceiver<SwitchMessage>>,
    messages_in: AtomicU64,
}

impl InPort {
    pub fn new(id: PortId) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            id,
            sender,
            receiver: AsyncMutex::new(receiver),
            messages_in: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    /// Enqueue a message. Never blocks and never drops.
    pub fn write(&self, msg: impl Into<SwitchMessage>) -> Result<(), PortError> {
        self.sender
            .send(msg.into())
            .map_err(|_| PortError::Closed { port: self.id })?;
        self.messages_in.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Wait for the next message in arrival order.
    ///
    /// Cancel safe: a message is either returned or stays queued.
    pub async fn read(&self) -> Option<SwitchMessage> {
        self.receiver.lock().await.recv().await
    }

    /// Take exclusive read access until the returned reader is dropped.
    ///
    /// Other `read`/`reader` calls wait meanwhile, so one holder sees every
    /// message it consumes in arrival order.
    pub async fn reader(&self) -> InPortReader<'_> {
        InPortReader {
            id: self.id,
            receiver: self.receiver.lock().await,
        }
    }

    /// Messages written so far.
    pub fn messages_in(&self) -> u64 {
        self.messages_in.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for InPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InPort")
            .field("id", &self.id)
            .field("messages_in", &self.messages_in())
            .finish()
    }
}

/// Exclusive read handle of an [`InPort`].
pub struct InPortReader<'a> {
    id: PortId,
    receiver: AsyncMutexGuard<'a, mpsc::UnboundedReceiver<SwitchMessage>>,
}

impl InPortReader<'_> {
    pub fn id(&self) -> PortId {
        self.id
    }

    /// Wait for the next message. Cancel safe.
    pub async fn recv(&mut self) -> Option<SwitchMessage> {
        self.receiver.recv().await
    }
}

/// Switch egress port.
pub struct OutPort {
    id: PortId,
    outputs: Mutex<Vec<OutputFn>>,
    messages_out: AtomicU64,
}

impl OutPort {
    pub fn new(id: PortId) -> Self {
        Self {
            id,
            outputs: Mutex::new(Vec::new()),
            messages_out: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    /// Append an output function. It sees every message written after this call.
    pub fn bind<F>(&self, output: F) -> Result<(), PortError>
    where
        F: Fn(&SwitchMessage) -> Result<(), OutputError> + Send + Sync + 'static,
    {
        let mut outputs = self.outputs.lock();
        outputs.push(Box::new(output));
        info!(port = self.id, subscribers = outputs.len(), "Bound output function to out port");
        Ok(())
    }

    /// Deliver `msg` to every output function in binding order.
    ///
    /// A failing output does not stop later ones; failures are reported
    /// together once all outputs ran.
    pub fn write(&self, msg: &SwitchMessage) -> Result<(), PortError> {
        let outputs = self.outputs.lock();
        let total = outputs.len();
        let mut failed = 0usize;
        let mut first: Option<String> = None;

        for (index, output) in outputs.iter().enumerate() {
            if let Err(e) = output(msg) {
                warn!(port = self.id, subscriber = index, error = %e, "Output function failed");
                failed += 1;
                first.get_or_insert_with(|| e.to_string());
            }
        }
        self.messages_out.fetch_add(1, Ordering::Relaxed);
        debug!(port = self.id, kind = ?msg.kind(), subscribers = total, "Message written to out port");

        match first {
            Some(first) => Err(PortError::SubscriberFailures {
                port: self.id,
                failed,
                total,
                first,
            }),
            None => Ok(()),
        }
    }

    /// Number of bound output functions.
    pub fn subscriber_count(&self) -> usize {
        self.outputs.lock().len()
    }

    /// Messages written so far.
    pub fn messages_out(&self) -> u64 {
        self.messages_out.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for OutPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutPort")
            .field("id", &self.id)
            .field("subscribers", &self.subscriber_count())
            .field("messages_out", &self.messages_out())
            .finish()
    }
}
