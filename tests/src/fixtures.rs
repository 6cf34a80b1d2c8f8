//! Shared fixtures for integration tests and benchmarks.

use qc_05_gossip_switch::adapters::{encode_kv_payload, sign_transaction, KvExecutor, MemoryChain};
use qc_05_gossip_switch::filter::{genesis_block, seal_block};
use qc_05_gossip_switch::{SignerScheme, ValidationError, WorkerOptions};
use rand::Rng;
use shared_crypto::{Hasher, Secp256k1KeyPair};
use shared_types::{Block, Hash, Transaction, TxData};
use std::sync::Arc;

pub const TEST_CHAIN_ID: u64 = 1337;

/// Install a `RUST_LOG`-driven subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An in-memory chain at genesis.
pub struct TestChain {
    pub chain: Arc<MemoryChain>,
    pub genesis: Block,
    pub hasher: Hasher,
}

impl TestChain {
    pub fn new(hasher: Hasher) -> Self {
        let genesis = genesis_block(TEST_CHAIN_ID, 1_700_000_000, &hasher);
        Self {
            chain: Arc::new(MemoryChain::new(genesis.clone(), hasher)),
            genesis,
            hasher,
        }
    }

    /// Seal a valid child of `parent` on this chain.
    pub fn seal(&self, parent: &Block, transactions: Vec<Transaction>) -> Result<Block, ValidationError> {
        let options = WorkerOptions {
            hasher: self.hasher,
            ..Default::default()
        };
        seal_block(self.chain.as_ref(), &KvExecutor::new(), parent, transactions, options)
    }
}

/// Random key/value writes.
pub fn random_writes(rng: &mut impl Rng, count: usize) -> Vec<(Hash, Hash)> {
    (0..count).map(|_| (rng.gen(), rng.gen())).collect()
}

/// Key/value transaction signed with the plain scheme.
pub fn signed_kv_tx(key: &Secp256k1KeyPair, nonce: u64, writes: &[(Hash, Hash)]) -> Transaction {
    signed_kv_tx_with(key, nonce, writes, SignerScheme::Frontier)
}

/// Key/value transaction signed under `scheme`.
pub fn signed_kv_tx_with(
    key: &Secp256k1KeyPair,
    nonce: u64,
    writes: &[(Hash, Hash)],
    scheme: SignerScheme,
) -> Transaction {
    let mut data = TxData {
        account_nonce: nonce,
        recipient: Some([0xC0; 20]),
        payload: encode_kv_payload(writes),
        ..Default::default()
    };
    sign_transaction(&mut data, key, scheme).expect("sign fixture transaction");
    Transaction::new(data)
}
