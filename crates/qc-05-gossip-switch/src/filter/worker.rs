//! # Block Validation Worker
//!
//! Single-use state machine that checks one candidate block against its
//! parent and replays its transactions.
//!
//! ## Check order
//!
//! 1. Parent lookup by `prev_block_hash`
//! 2. Chain id equals the parent's
//! 3. `prev_block_hash` equals the parent's header hash
//! 4. Height is parent height + 1
//! 5. Tx root equals the merkle root of the transaction hashes
//! 6. Header hash, unless unassigned
//! 7. Transaction replay with receipts
//! 8. Receipts root: assigned if zero, compared otherwise
//! 9. State root equals the view's intermediate root
//! 10. Mix digest, unless unassigned
//!
//! The first failing check wins.

use crate::domain::{
    compute_merkle_root, header_digest, header_hash, logs_bloom, receipt_hash, tx_hash, tx_hashes,
    GasPool, SignerScheme, DEFAULT_BLOCK_GAS_LIMIT,
};
use crate::errors::ValidationError;
use crate::ports::{ChainRepository, ExecutionContext, SenderRecoverer, TransactionExecutor};
use shared_crypto::Hasher;
use shared_types::{is_zero_hash, Block, Hash, Log, Receipt, Transaction};
use tracing::{debug, info, warn};

/// Tunables shared by every worker a filter creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOptions {
    pub hasher: Hasher,
    /// Gas budget for replaying all transactions of one block.
    pub gas_limit: u64,
    /// Check each transaction's declared sender against its signature.
    pub verify_signature: bool,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            hasher: Hasher::default(),
            gas_limit: DEFAULT_BLOCK_GAS_LIMIT,
            verify_signature: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Pending,
    Verified,
    Failed,
}

/// Validates one block. Create a new worker per block.
pub struct Worker<'a> {
    chain: &'a dyn ChainRepository,
    executor: &'a dyn TransactionExecutor,
    recoverer: &'a dyn SenderRecoverer,
    block: &'a mut Block,
    options: WorkerOptions,
    state: WorkerState,
    receipts: Vec<Receipt>,
    logs: Vec<Log>,
}

impl<'a> Worker<'a> {
    pub fn new(
        chain: &'a dyn ChainRepository,
        executor: &'a dyn TransactionExecutor,
        recoverer: &'a dyn SenderRecoverer,
        block: &'a mut Block,
        options: WorkerOptions,
    ) -> Self {
        Self {
            chain,
            executor,
            recoverer,
            block,
            options,
            state: WorkerState::Pending,
            receipts: Vec::new(),
            logs: Vec::new(),
        }
    }

    /// Run every check. May only be called once.
    ///
    /// On success the receipts root of an unassigned header is filled in
    /// and receipts and logs become available.
    pub fn verify_block(&mut self) -> Result<(), ValidationError> {
        if self.state != WorkerState::Pending {
            return Err(ValidationError::AlreadyRun);
        }
        let result = self.run_checks();
        self.state = match result {
            Ok(()) => WorkerState::Verified,
            Err(_) => WorkerState::Failed,
        };
        result
    }

    /// Receipts in transaction order. Empty unless verification succeeded.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Logs of all receipts in order.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    pub fn into_receipts(self) -> Vec<Receipt> {
        self.receipts
    }

    pub fn is_verified(&self) -> bool {
        self.state == WorkerState::Verified
    }

    fn run_checks(&mut self) -> Result<(), ValidationError> {
        let hasher = self.options.hasher;
        let header = &self.block.header;

        let parent = self
            .chain
            .get_block_by_hash(&header.prev_block_hash)
            .map_err(|source| ValidationError::NoParent {
                parent: header.prev_block_hash,
                source,
            })?;

        if header.chain_id != parent.header.chain_id {
            return Err(ValidationError::ChainMismatch {
                expected: parent.header.chain_id,
                got: header.chain_id,
            });
        }

        if header.prev_block_hash != parent.header_hash {
            return Err(ValidationError::LinkMismatch {
                expected: parent.header_hash,
                got: header.prev_block_hash,
            });
        }

        let expected_height = parent.header.height.saturating_add(1);
        if header.height != expected_height {
            return Err(ValidationError::HeightMismatch {
                expected: expected_height,
                got: header.height,
            });
        }

        let tx_root = compute_merkle_root(&hasher, &tx_hashes(&hasher, &self.block.transactions));
        if header.tx_root != tx_root {
            return Err(ValidationError::TxRootMismatch {
                expected: tx_root,
                got: header.tx_root,
            });
        }

        if !is_zero_hash(&self.block.header_hash) {
            let computed = header_hash(&hasher, header);
            if computed != self.block.header_hash {
                return Err(ValidationError::HeaderMismatch {
                    expected: computed,
                    got: self.block.header_hash,
                });
            }
        }

        let (receipts, logs) = self.replay_transactions()?;

        let receipt_hashes: Vec<Hash> = receipts.iter().map(|r| receipt_hash(&hasher, r)).collect();
        let receipts_root = compute_merkle_root(&hasher, &receipt_hashes);
        if is_zero_hash(&self.block.header.receipts_root) {
            debug!(
                height = self.block.header.height,
                receipts_root = %hex::encode(receipts_root),
                "Assign receipts root to block"
            );
            self.block.header.receipts_root = receipts_root;
        } else if self.block.header.receipts_root != receipts_root {
            return Err(ValidationError::ReceiptsMismatch {
                expected: receipts_root,
                got: self.block.header.receipts_root,
            });
        }

        let header = &self.block.header;

        let state_root = self.chain.intermediate_root(false);
        if header.state_root != state_root {
            warn!(
                computed = %hex::encode(state_root),
                declared = %hex::encode(header.state_root),
                "State root is inconsistent"
            );
            return Err(ValidationError::StateRootMismatch {
                expected: state_root,
                got: header.state_root,
            });
        }

        if !is_zero_hash(&header.mix_digest) {
            let digest = header_digest(&hasher, header);
            if digest != header.mix_digest {
                return Err(ValidationError::DigestMismatch {
                    expected: digest,
                    got: header.mix_digest,
                });
            }
        }

        self.receipts = receipts;
        self.logs = logs;
        Ok(())
    }

    pub(super) fn replay_transactions(&self) -> Result<(Vec<Receipt>, Vec<Log>), ValidationError> {
        let mut gas_pool = GasPool::new(self.options.gas_limit);
        let mut cumulative_gas = 0u64;
        let mut receipts = Vec::with_capacity(self.block.transactions.len());
        let mut logs = Vec::new();

        for (index, tx) in self.block.transactions.iter().enumerate() {
            let receipt = self.apply_transaction(index, tx, &mut gas_pool, &mut cumulative_gas)?;
            logs.extend(receipt.logs.iter().cloned());
            receipts.push(receipt);
        }
        Ok((receipts, logs))
    }

    fn apply_transaction(
        &self,
        index: usize,
        tx: &Transaction,
        gas_pool: &mut GasPool,
        cumulative_gas: &mut u64,
    ) -> Result<Receipt, ValidationError> {
        let hash = tx_hash(&self.options.hasher, tx);

        if self.options.verify_signature {
            self.check_signature(index, tx)?;
        }

        self.chain.prepare(hash, self.block.header_hash, index);
        let ctx = ExecutionContext {
            tx,
            tx_hash: hash,
            tx_index: index,
            header: &self.block.header,
            chain: self.chain,
            coinbase: self.block.header.coinbase,
        };
        let outcome = self.executor.apply(&ctx, gas_pool).map_err(|source| {
            warn!(tx_hash = %hex::encode(hash), error = %source, "Apply transaction failed");
            ValidationError::Execution { index, source }
        })?;

        let root = self.chain.intermediate_root(false);
        *cumulative_gas = cumulative_gas.saturating_add(outcome.gas_used);

        let mut receipt = Receipt::new(root, outcome.failed, *cumulative_gas);
        receipt.tx_hash = hash;
        receipt.gas_used = outcome.gas_used;
        if tx.is_contract_creation() {
            receipt.contract_address = outcome.contract_address;
            info!(
                tx_hash = %hex::encode(hash),
                contract = ?outcome.contract_address.map(hex::encode),
                "Contract created"
            );
        }
        receipt.logs = self.chain.get_logs(&hash);
        receipt.bloom = logs_bloom(&receipt.logs);
        Ok(receipt)
    }

    /// Transactions inside blocks are checked with the plain scheme.
    fn check_signature(&self, index: usize, tx: &Transaction) -> Result<(), ValidationError> {
        let declared = tx.data.from.ok_or_else(|| ValidationError::TxSignature {
            index,
            reason: "no declared sender".into(),
        })?;
        let recovered = self
            .recoverer
            .recover_sender(SignerScheme::Frontier, &tx.data)
            .map_err(|e| ValidationError::TxSignature {
                index,
                reason: e.to_string(),
            })?;
        if recovered != declared {
            return Err(ValidationError::TxSignature {
                index,
                reason: format!(
                    "declared {}, recovered {}",
                    hex::encode(declared),
                    hex::encode(recovered)
                ),
            });
        }
        Ok(())
    }
}
