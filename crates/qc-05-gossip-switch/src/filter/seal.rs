//! Block assembly for local proposers and tests.
//!
//! A sealed block passes every worker check against the chain it was
//! sealed on: roots and digest are filled in from a replay on a fresh view
//! of the parent.

use super::worker::{Worker, WorkerOptions};
use crate::adapters::EcdsaSenderRecoverer;
use crate::domain::{compute_merkle_root, header_digest, header_hash, receipt_hash, tx_hashes};
use crate::errors::ValidationError;
use crate::ports::{ChainProvider, ChainRepository, TransactionExecutor};
use shared_crypto::Hasher;
use shared_types::{Block, Hash, Header, Transaction};
use tracing::debug;

/// Create a genesis block with an empty state.
pub fn genesis_block(chain_id: u64, timestamp: u64, hasher: &Hasher) -> Block {
    let header = Header {
        chain_id,
        height: 0,
        timestamp,
        // Empty state and empty transaction list both have the sentinel root.
        tx_root: compute_merkle_root(hasher, &[]),
        receipts_root: compute_merkle_root(hasher, &[]),
        ..Default::default()
    };
    let mut block = Block::new(header, Vec::new());
    block.header_hash = header_hash(hasher, &block.header);
    block
}

/// Build the child of `parent` carrying `transactions`.
///
/// Signatures are not checked; the replay charges gas against
/// `options.gas_limit` and fails like verification would.
pub fn seal_block(
    chain: &dyn ChainProvider,
    executor: &dyn TransactionExecutor,
    parent: &Block,
    transactions: Vec<Transaction>,
    options: WorkerOptions,
) -> Result<Block, ValidationError> {
    let hasher = options.hasher;
    let view = chain
        .state_at(&parent.header_hash)
        .map_err(|source| ValidationError::NoParent {
            parent: parent.header_hash,
            source,
        })?;

    let header = Header {
        chain_id: parent.header.chain_id,
        prev_block_hash: parent.header_hash,
        height: parent.header.height.saturating_add(1),
        tx_root: compute_merkle_root(&hasher, &tx_hashes(&hasher, &transactions)),
        timestamp: parent.header.timestamp.saturating_add(1),
        coinbase: parent.header.coinbase,
        ..Default::default()
    };
    let mut block = Block::new(header, transactions);

    let options = WorkerOptions {
        verify_signature: false,
        ..options
    };
    let recoverer = EcdsaSenderRecoverer;
    let (receipts, _logs) =
        Worker::new(view.as_ref(), executor, &recoverer, &mut block, options).replay_transactions()?;

    let receipt_hashes: Vec<Hash> = receipts.iter().map(|r| receipt_hash(&hasher, r)).collect();
    block.header.receipts_root = compute_merkle_root(&hasher, &receipt_hashes);
    block.header.state_root = view.intermediate_root(false);
    block.header.mix_digest = header_digest(&hasher, &block.header);
    block.header_hash = header_hash(&hasher, &block.header);

    debug!(
        height = block.header.height,
        txs = block.transactions.len(),
        hash = %hex::encode(block.header_hash),
        "Sealed block"
    );
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{KvExecutor, MemoryChain};
    use shared_types::ZERO_HASH;

    #[test]
    fn test_genesis_is_self_consistent() {
        let hasher = Hasher::default();
        let genesis = genesis_block(3, 1_700_000_000, &hasher);

        assert_eq!(genesis.header.height, 0);
        assert_eq!(genesis.header.prev_block_hash, ZERO_HASH);
        assert_eq!(genesis.header_hash, header_hash(&hasher, &genesis.header));
    }

    #[test]
    fn test_sealed_block_links_to_parent() {
        let hasher = Hasher::default();
        let genesis = genesis_block(3, 0, &hasher);
        let chain = MemoryChain::new(genesis.clone(), hasher);

        let block = seal_block(&chain, &KvExecutor::new(), &genesis, vec![], WorkerOptions::default())
            .unwrap();

        assert_eq!(block.header.prev_block_hash, genesis.header_hash);
        assert_eq!(block.header.height, 1);
        assert_eq!(block.header.chain_id, 3);
        assert_ne!(block.header.mix_digest, ZERO_HASH);
    }

    #[test]
    fn test_seal_unknown_parent() {
        let hasher = Hasher::default();
        let genesis = genesis_block(3, 0, &hasher);
        let chain = MemoryChain::new(genesis.clone(), hasher);
        let mut orphan = genesis.clone();
        orphan.header_hash = [0xAB; 32];

        let result = seal_block(&chain, &KvExecutor::new(), &orphan, vec![], WorkerOptions::default());
        assert!(matches!(result, Err(ValidationError::NoParent { .. })));
    }
}
