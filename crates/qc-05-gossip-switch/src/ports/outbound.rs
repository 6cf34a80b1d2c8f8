//! Outbound ports (SPI) for the gossip switch.
//!
//! Everything the filters need from the rest of the node: chain state,
//! transaction execution, sender recovery and event delivery.

use crate::domain::{GasPool, SignerScheme};
use crate::errors::{EventError, ExecutionError, RecoveryError};
use shared_bus::SwitchEvent;
use shared_types::{Address, Block, ChainError, Hash, Header, Log, Receipt, Transaction, TxData};
use std::sync::Arc;

/// Key/value state surface that executors read and mutate.
///
/// Implementations use interior mutability; one view is shared by the
/// worker and the executor for the duration of a block replay.
pub trait StateAccess: Send + Sync {
    /// Read a state slot.
    fn get_state(&self, key: &Hash) -> Option<Hash>;

    /// Write a state slot in the pending state of this view.
    fn set_state(&self, key: Hash, value: Hash);

    /// Record a log for the transaction set by the last `prepare`.
    fn add_log(&self, log: Log);
}

/// A chain view whose state is rooted at one block.
pub trait ChainRepository: StateAccess {
    /// Look up a stored block.
    fn get_block_by_hash(&self, hash: &Hash) -> Result<Block, ChainError>;

    /// Head of the chain (highest stored block), not the view's root.
    fn current_block(&self) -> Result<Block, ChainError>;

    /// Height of [`ChainRepository::current_block`].
    fn current_height(&self) -> u64;

    /// True if a block with this header hash is stored.
    fn has_block(&self, hash: &Hash) -> bool;

    /// Root of the pending state. `commit` also folds it into the view's base.
    fn intermediate_root(&self, commit: bool) -> Hash;

    /// Set the transaction context for subsequent `add_log` calls.
    fn prepare(&self, tx_hash: Hash, block_hash: Hash, tx_index: usize);

    /// Logs recorded for a transaction.
    fn get_logs(&self, tx_hash: &Hash) -> Vec<Log>;

    /// Persist a verified block, its receipts and this view's pending state.
    fn write_block_with_receipts(&self, block: &Block, receipts: &[Receipt])
        -> Result<(), ChainError>;
}

/// Source of chain views.
pub trait ChainProvider: Send + Sync {
    /// A fresh view rooted at `block_hash`.
    fn state_at(&self, block_hash: &Hash) -> Result<Arc<dyn ChainRepository>, ChainError>;
}

/// Everything an executor sees for one transaction.
pub struct ExecutionContext<'a> {
    pub tx: &'a Transaction,
    pub tx_hash: Hash,
    pub tx_index: usize,
    pub header: &'a Header,
    pub chain: &'a dyn ChainRepository,
    /// Block beneficiary.
    pub coinbase: Address,
}

/// Result of applying one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub return_data: Vec<u8>,
    pub gas_used: u64,
    /// Reverted; state changes were discarded but gas was charged.
    pub failed: bool,
    /// Set when the transaction created a contract.
    pub contract_address: Option<Address>,
}

/// Applies a transaction to a chain view.
pub trait TransactionExecutor: Send + Sync {
    /// Execute, charging gas from `gas_pool`.
    ///
    /// `Err` aborts the whole block; a reverted transaction is `Ok` with
    /// `failed = true`.
    fn apply(
        &self,
        ctx: &ExecutionContext<'_>,
        gas_pool: &mut GasPool,
    ) -> Result<ExecutionOutcome, ExecutionError>;
}

/// Recovers the signer of a transaction.
pub trait SenderRecoverer: Send + Sync {
    fn recover_sender(&self, scheme: SignerScheme, tx: &TxData) -> Result<Address, RecoveryError>;
}

/// Receives verification outcomes.
pub trait EventSink: Send + Sync {
    fn notify(&self, event: SwitchEvent) -> Result<(), EventError>;
}
