//! # Gossip Switch Service
//!
//! Connects in ports to out ports through a [`SwitchFilter`].
//!
//! ## Flow
//!
//! ```text
//! [LocalIn 0]  ──┐                       ┌──→ [LocalOut 0]
//!                ├─→ filter.verify() ─ok─┤
//! [RemoteIn 1] ──┘                       └──→ [RemoteOut 1]
//! ```
//!
//! One receive task per in port. Verification runs on the blocking pool;
//! a valid message is written to every out port before the task reads the
//! next one, so each out port sees one in port's messages in arrival order.
//!
//! ## Lifecycle
//!
//! `start` and `stop` flip an atomic flag with compare-and-swap. `stop`
//! signals a watch channel; loops parked on an empty port exit at once, a
//! message already being verified is finished first. Unread messages stay
//! queued for the next `start`. Each loop holds its port's reader for its
//! whole run, so a loop spawned by a quick restart waits for the old one.

use crate::adapters::EcdsaSenderRecoverer;
use crate::config::{SwitchConfig, SwitchType};
use crate::domain::{
    PortId, SwitchMessage, LOCAL_IN_PORT_ID, LOCAL_OUT_PORT_ID, REMOTE_IN_PORT_ID,
    REMOTE_OUT_PORT_ID,
};
use crate::errors::{SwitchError, SwitchResult};
use crate::filter::{BlockFilter, TxFilter, WorkerOptions};
use crate::port::{InPort, OutPort};
use crate::ports::{
    ChainProvider, EventSink, GossipSwitchApi, SenderRecoverer, SwitchFilter, TransactionExecutor,
};
use parking_lot::Mutex;
use shared_crypto::Hasher;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Collaborators injected into a switch built by [`GossipSwitch::by_type`].
///
/// A block switch needs `chain` and `executor`; a transaction switch
/// ignores them.
#[derive(Clone)]
pub struct Collaborators {
    pub events: Arc<dyn EventSink>,
    pub recoverer: Arc<dyn SenderRecoverer>,
    pub chain: Option<Arc<dyn ChainProvider>>,
    pub executor: Option<Arc<dyn TransactionExecutor>>,
}

impl Collaborators {
    /// Event sink plus the secp256k1 recoverer.
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self {
            events,
            recoverer: Arc::new(EcdsaSenderRecoverer),
            chain: None,
            executor: None,
        }
    }

    pub fn with_recoverer(mut self, recoverer: Arc<dyn SenderRecoverer>) -> Self {
        self.recoverer = recoverer;
        self
    }

    pub fn with_chain(mut self, chain: Arc<dyn ChainProvider>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn TransactionExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }
}

#[derive(Default)]
struct Lifecycle {
    shutdown: Option<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
}

/// Validating message switch.
pub struct GossipSwitch {
    filter: Arc<dyn SwitchFilter>,
    in_ports: BTreeMap<PortId, Arc<InPort>>,
    out_ports: BTreeMap<PortId, Arc<OutPort>>,
    running: AtomicBool,
    lifecycle: Mutex<Lifecycle>,
}

impl GossipSwitch {
    /// Switch with the standard local and remote ports around `filter`.
    pub fn new(filter: Arc<dyn SwitchFilter>) -> Self {
        let in_ports = [LOCAL_IN_PORT_ID, REMOTE_IN_PORT_ID]
            .into_iter()
            .map(|id| (id, Arc::new(InPort::new(id))))
            .collect();
        let out_ports = [LOCAL_OUT_PORT_ID, REMOTE_OUT_PORT_ID]
            .into_iter()
            .map(|id| (id, Arc::new(OutPort::new(id))))
            .collect();

        Self {
            filter,
            in_ports,
            out_ports,
            running: AtomicBool::new(false),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Build the switch `config` asks for.
    pub fn by_type(config: &SwitchConfig, collaborators: Collaborators) -> SwitchResult<Self> {
        let hasher = Hasher::new(config.hash_algorithm);
        let Collaborators {
            events,
            recoverer,
            chain,
            executor,
        } = collaborators;

        let filter: Arc<dyn SwitchFilter> = match config.switch_type {
            SwitchType::Transaction => Arc::new(TxFilter::new(
                events,
                recoverer,
                config.verify_signature,
                config.chain_id,
                hasher,
            )),
            SwitchType::Block => {
                let chain = chain.ok_or(SwitchError::MissingCollaborator("chain provider"))?;
                let executor =
                    executor.ok_or(SwitchError::MissingCollaborator("transaction executor"))?;
                let options = WorkerOptions {
                    hasher,
                    gas_limit: config.block_gas_limit,
                    verify_signature: config.verify_signature,
                };
                Arc::new(BlockFilter::new(events, chain, executor, recoverer, options))
            }
        };

        info!(
            switch_type = %config.switch_type,
            hash_algorithm = %config.hash_algorithm,
            verify_signature = config.verify_signature,
            chain_id = config.chain_id,
            "Gossip switch created"
        );
        Ok(Self::new(filter))
    }

    pub fn in_port(&self, id: PortId) -> Option<Arc<InPort>> {
        self.in_ports.get(&id).cloned()
    }

    pub fn out_port(&self, id: PortId) -> Option<Arc<OutPort>> {
        self.out_ports.get(&id).cloned()
    }

    /// Spawn one receive task per in port on the current tokio runtime.
    pub fn start(&self) -> SwitchResult<()> {
        let runtime = Handle::try_current().map_err(|_| SwitchError::NoRuntime)?;
        let mut lifecycle = self.lifecycle.lock();

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SwitchError::AlreadyStarted);
        }

        let (shutdown, signal) = watch::channel(false);
        let outputs: Vec<Arc<OutPort>> = self.out_ports.values().cloned().collect();

        lifecycle.tasks.retain(|task| !task.is_finished());
        for port in self.in_ports.values() {
            lifecycle.tasks.push(runtime.spawn(receive_loop(
                port.clone(),
                self.filter.clone(),
                outputs.clone(),
                signal.clone(),
            )));
        }
        lifecycle.shutdown = Some(shutdown);

        info!(in_ports = self.in_ports.len(), out_ports = outputs.len(), "Gossip switch started");
        Ok(())
    }

    /// Signal every receive task to exit.
    pub fn stop(&self) -> SwitchResult<()> {
        let mut lifecycle = self.lifecycle.lock();

        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SwitchError::AlreadyStopped);
        }

        if let Some(shutdown) = lifecycle.shutdown.take() {
            if shutdown.send(true).is_err() {
                debug!("All receive loops already exited");
            }
        }

        info!("Gossip switch stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Wait for the receive tasks spawned so far to exit.
    pub async fn join(&self) {
        let tasks = std::mem::take(&mut self.lifecycle.lock().tasks);
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Receive task failed");
            }
        }
    }
}

impl GossipSwitchApi for GossipSwitch {
    fn in_port(&self, id: PortId) -> Option<Arc<InPort>> {
        GossipSwitch::in_port(self, id)
    }

    fn out_port(&self, id: PortId) -> Option<Arc<OutPort>> {
        GossipSwitch::out_port(self, id)
    }

    fn start(&self) -> Result<(), SwitchError> {
        GossipSwitch::start(self)
    }

    fn stop(&self) -> Result<(), SwitchError> {
        GossipSwitch::stop(self)
    }

    fn is_running(&self) -> bool {
        GossipSwitch::is_running(self)
    }
}

impl Drop for GossipSwitch {
    fn drop(&mut self) {
        if let Some(shutdown) = self.lifecycle.get_mut().shutdown.take() {
            let _ = shutdown.send(true);
        }
    }
}

async fn receive_loop(
    port: Arc<InPort>,
    filter: Arc<dyn SwitchFilter>,
    outputs: Vec<Arc<OutPort>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let port_id = port.id();

    // A loop left over from before a restart keeps the reader until it
    // finishes its current message.
    let mut reader = tokio::select! {
        biased;
        _ = shutdown.changed() => return,
        reader = port.reader() => reader,
    };
    debug!(port = port_id, "Receive loop started");

    loop {
        let msg = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            msg = reader.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };

        let kind = msg.kind();
        let filter = filter.clone();
        let verified = tokio::task::spawn_blocking(move || {
            let mut msg = msg;
            filter.verify(port_id, &mut msg).map(|()| msg)
        })
        .await;

        match verified {
            Ok(Ok(msg)) => broadcast(&outputs, msg).await,
            Ok(Err(e)) => debug!(port = port_id, kind = ?kind, error = %e, "Message dropped"),
            Err(e) => error!(port = port_id, kind = ?kind, error = %e, "Verification task failed"),
        }
    }

    debug!(port = port_id, "Receive loop stopped");
}

async fn broadcast(outputs: &[Arc<OutPort>], msg: SwitchMessage) {
    let msg = Arc::new(msg);
    let writes: Vec<_> = outputs
        .iter()
        .map(|port| {
            let port = port.clone();
            let msg = msg.clone();
            tokio::task::spawn_blocking(move || port.write(&msg))
        })
        .collect();

    for (port, write) in outputs.iter().zip(writes) {
        match write.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(port = port.id(), error = %e, "Broadcast incomplete"),
            Err(e) => error!(port = port.id(), error = %e, "Out port task failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{KvExecutor, MemoryChain, RecordingEventSink};
    use crate::errors::FilterError;
    use crate::filter::genesis_block;
    use shared_bus::SwitchEvent;
    use shared_types::{Transaction, TxData};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    fn tx_switch(verify_signature: bool) -> (GossipSwitch, Arc<RecordingEventSink>) {
        let sink = Arc::new(RecordingEventSink::new());
        let config = SwitchConfig {
            verify_signature,
            ..SwitchConfig::transaction()
        };
        let switch = GossipSwitch::by_type(&config, Collaborators::new(sink.clone())).unwrap();
        (switch, sink)
    }

    fn tap(port: &OutPort) -> mpsc::UnboundedReceiver<SwitchMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        port.bind(move |msg| {
            tx.send(msg.clone())?;
            Ok(())
        })
        .unwrap();
        rx
    }

    fn tx(nonce: u64) -> Transaction {
        Transaction::new(TxData {
            account_nonce: nonce,
            ..Default::default()
        })
    }

    /// Accepts everything, taking its time over nonce 0.
    struct SlowFirstFilter;

    impl SwitchFilter for SlowFirstFilter {
        fn verify(&self, _port: PortId, msg: &mut SwitchMessage) -> Result<(), FilterError> {
            if msg.as_transaction().map(|t| t.data.account_nonce) == Some(0) {
                std::thread::sleep(Duration::from_millis(300));
            }
            Ok(())
        }
    }

    #[test]
    fn test_ports_by_id() {
        let (switch, _) = tx_switch(false);
        assert!(switch.in_port(LOCAL_IN_PORT_ID).is_some());
        assert!(switch.in_port(REMOTE_IN_PORT_ID).is_some());
        assert!(switch.out_port(LOCAL_OUT_PORT_ID).is_some());
        assert!(switch.out_port(REMOTE_OUT_PORT_ID).is_some());
        assert!(switch.in_port(2).is_none());
        assert!(switch.out_port(7).is_none());
    }

    #[test]
    fn test_start_without_runtime() {
        let (switch, _) = tx_switch(false);
        assert!(matches!(switch.start(), Err(SwitchError::NoRuntime)));
        assert!(!switch.is_running());
    }

    #[test]
    fn test_block_switch_requires_collaborators() {
        let sink = Arc::new(RecordingEventSink::new());
        let result = GossipSwitch::by_type(&SwitchConfig::block(), Collaborators::new(sink.clone()));
        assert!(matches!(result, Err(SwitchError::MissingCollaborator("chain provider"))));

        let hasher = Hasher::default();
        let chain = Arc::new(MemoryChain::new(genesis_block(1, 0, &hasher), hasher));
        let result = GossipSwitch::by_type(
            &SwitchConfig::block(),
            Collaborators::new(sink.clone()).with_chain(chain.clone()),
        );
        assert!(matches!(result, Err(SwitchError::MissingCollaborator("transaction executor"))));

        let result = GossipSwitch::by_type(
            &SwitchConfig::block(),
            Collaborators::new(sink)
                .with_chain(chain)
                .with_executor(Arc::new(KvExecutor::new())),
        );
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let (switch, _) = tx_switch(false);

        switch.start().unwrap();
        assert!(matches!(switch.start(), Err(SwitchError::AlreadyStarted)));
        assert!(switch.is_running());

        switch.stop().unwrap();
        assert!(matches!(switch.stop(), Err(SwitchError::AlreadyStopped)));
        assert!(!switch.is_running());
    }

    #[tokio::test]
    async fn test_stop_interrupts_idle_loops() {
        let (switch, _) = tx_switch(false);
        switch.start().unwrap();
        switch.stop().unwrap();

        timeout(WAIT, switch.join()).await.unwrap();
    }

    #[tokio::test]
    async fn test_valid_message_reaches_every_out_port() {
        let (switch, sink) = tx_switch(false);
        let mut local = tap(&switch.out_port(LOCAL_OUT_PORT_ID).unwrap());
        let mut remote = tap(&switch.out_port(REMOTE_OUT_PORT_ID).unwrap());
        switch.start().unwrap();

        switch.in_port(REMOTE_IN_PORT_ID).unwrap().write(tx(1)).unwrap();

        let a = timeout(WAIT, local.recv()).await.unwrap().unwrap();
        let b = timeout(WAIT, remote.recv()).await.unwrap().unwrap();
        assert_eq!(a, SwitchMessage::Transaction(tx(1)));
        assert_eq!(a, b);
        assert!(matches!(sink.events()[0], SwitchEvent::TxVerifySucceeded { .. }));

        switch.stop().unwrap();
        switch.join().await;
    }

    #[tokio::test]
    async fn test_rejected_message_not_broadcast() {
        let (switch, sink) = tx_switch(true);
        let mut local = tap(&switch.out_port(LOCAL_OUT_PORT_ID).unwrap());
        switch.start().unwrap();

        // No declared sender.
        switch.in_port(LOCAL_IN_PORT_ID).unwrap().write(tx(1)).unwrap();

        timeout(WAIT, async {
            while sink.event_count() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(matches!(sink.events()[0], SwitchEvent::TxVerifyFailed { .. }));
        assert!(timeout(Duration::from_millis(50), local.recv()).await.is_err());

        switch.stop().unwrap();
        switch.join().await;
    }

    #[tokio::test]
    async fn test_arrival_order_preserved() {
        let (switch, _) = tx_switch(false);
        let mut remote = tap(&switch.out_port(REMOTE_OUT_PORT_ID).unwrap());
        switch.start().unwrap();

        let input = switch.in_port(LOCAL_IN_PORT_ID).unwrap();
        for nonce in 0..20 {
            input.write(tx(nonce)).unwrap();
        }

        for nonce in 0..20 {
            let msg = timeout(WAIT, remote.recv()).await.unwrap().unwrap();
            assert_eq!(msg.as_transaction().map(|t| t.data.account_nonce), Some(nonce));
        }

        switch.stop().unwrap();
        switch.join().await;
    }

    #[tokio::test]
    async fn test_queued_messages_survive_restart() {
        let (switch, _) = tx_switch(false);
        let mut local = tap(&switch.out_port(LOCAL_OUT_PORT_ID).unwrap());

        switch.start().unwrap();
        switch.stop().unwrap();
        switch.join().await;

        switch.in_port(LOCAL_IN_PORT_ID).unwrap().write(tx(5)).unwrap();
        assert!(timeout(Duration::from_millis(50), local.recv()).await.is_err());

        switch.start().unwrap();
        let msg = timeout(WAIT, local.recv()).await.unwrap().unwrap();
        assert_eq!(msg, SwitchMessage::Transaction(tx(5)));

        switch.stop().unwrap();
        switch.join().await;
    }

    #[tokio::test]
    async fn test_restart_keeps_port_order() {
        let switch = GossipSwitch::new(Arc::new(SlowFirstFilter));
        let mut local = tap(&switch.out_port(LOCAL_OUT_PORT_ID).unwrap());
        let input = switch.in_port(LOCAL_IN_PORT_ID).unwrap();

        switch.start().unwrap();
        input.write(tx(0)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Restart while nonce 0 is still being verified.
        switch.stop().unwrap();
        switch.start().unwrap();
        input.write(tx(1)).unwrap();

        for nonce in 0..2 {
            let msg = timeout(WAIT, local.recv()).await.unwrap().unwrap();
            assert_eq!(msg.as_transaction().map(|t| t.data.account_nonce), Some(nonce));
        }

        switch.stop().unwrap();
        timeout(WAIT, switch.join()).await.unwrap();
    }
}
