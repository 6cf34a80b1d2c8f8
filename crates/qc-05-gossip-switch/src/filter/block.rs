//! Block filter.
//!
//! ## Flow
//!
//! 1. Recompute the header hash and compare with the declared one
//! 2. Open a chain view at the parent
//! 3. Reject blocks the chain already has
//! 4. Run a [`Worker`] over the block
//! 5. Persist block, receipts and state
//!
//! Each step's failure is reported to the event sink and returned. The
//! whole flow, reporting included, runs under one lock, so events arrive
//! in admission order.

use super::worker::{Worker, WorkerOptions};
use crate::domain::{header_hash, MessageKind, PortId, SwitchMessage};
use crate::errors::{FilterError, FilterResult};
use crate::ports::{
    ChainProvider, ChainRepository, EventSink, SenderRecoverer, SwitchFilter, TransactionExecutor,
};
use parking_lot::Mutex;
use shared_bus::SwitchEvent;
use shared_types::Block;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Validates blocks against the local chain and persists the valid ones.
pub struct BlockFilter {
    events: Arc<dyn EventSink>,
    chain: Arc<dyn ChainProvider>,
    executor: Arc<dyn TransactionExecutor>,
    recoverer: Arc<dyn SenderRecoverer>,
    options: WorkerOptions,
    /// Serializes verify, write and report so two copies of one block
    /// cannot both pass.
    lock: Mutex<()>,
}

impl BlockFilter {
    pub fn new(
        events: Arc<dyn EventSink>,
        chain: Arc<dyn ChainProvider>,
        executor: Arc<dyn TransactionExecutor>,
        recoverer: Arc<dyn SenderRecoverer>,
        options: WorkerOptions,
    ) -> Self {
        Self {
            events,
            chain,
            executor,
            recoverer,
            options,
            lock: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &WorkerOptions {
        &self.options
    }

    /// Caller holds `self.lock`.
    fn verify_block(&self, block: &mut Block) -> FilterResult<()> {
        let computed = header_hash(&self.options.hasher, &block.header);
        if computed != block.header_hash {
            return Err(FilterError::HeaderHashMismatch {
                computed,
                declared: block.header_hash,
            });
        }

        let parent = block.header.prev_block_hash;
        let view = self
            .chain
            .state_at(&parent)
            .map_err(|source| FilterError::MissingParentState { parent, source })?;

        let current_height = view.current_height();
        if current_height >= block.header.height || view.has_block(&block.header_hash) {
            return Err(FilterError::BlockExists {
                height: block.header.height,
                current_height,
            });
        }

        let receipts = {
            let mut worker = Worker::new(
                view.as_ref(),
                self.executor.as_ref(),
                self.recoverer.as_ref(),
                block,
                self.options,
            );
            worker.verify_block()?;
            worker.into_receipts()
        };

        view.write_block_with_receipts(block, &receipts)
            .map_err(FilterError::Persist)?;

        info!(
            height = block.header.height,
            hash = %hex::encode(block.header_hash),
            txs = block.transactions.len(),
            "Block verified and written"
        );
        Ok(())
    }

    fn report_failure(&self, block: &Block, error: &FilterError) {
        let event = match error {
            FilterError::BlockExists {
                height,
                current_height,
            } => {
                debug!(height, current_height, "Block already known");
                SwitchEvent::BlockExisted {
                    block_hash: block.header_hash,
                    height: *height,
                    current_height: *current_height,
                }
            }
            other => {
                warn!(
                    height = block.header.height,
                    hash = %hex::encode(block.header_hash),
                    error = %other,
                    "Block rejected"
                );
                SwitchEvent::BlockVerifyFailed {
                    block_hash: block.header_hash,
                    height: block.header.height,
                    reason: other.to_string(),
                }
            }
        };
        if let Err(e) = self.events.notify(event) {
            warn!(error = %e, "Failed to deliver block event");
        }
    }
}

impl SwitchFilter for BlockFilter {
    fn verify(&self, port: PortId, msg: &mut SwitchMessage) -> FilterResult<()> {
        let kind = msg.kind();
        let SwitchMessage::Block(block) = msg else {
            return Err(FilterError::UnsupportedMessage {
                expected: MessageKind::Block,
                got: kind,
            });
        };

        debug!(port, height = block.header.height, "Verifying block");
        let _guard = self.lock.lock();
        let result = self.verify_block(block);
        if let Err(e) = &result {
            self.report_failure(block, e);
        }
        result
    }
}
