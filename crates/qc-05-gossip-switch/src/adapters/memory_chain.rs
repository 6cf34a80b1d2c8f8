//! In-memory chain store.
//!
//! Keeps every written block with its receipts and a full state snapshot.
//! [`MemoryChain::state_at`] hands out views rooted at one snapshot; a
//! view buffers writes and logs until the block is written.

use crate::domain::compute_merkle_root;
use crate::ports::{ChainProvider, ChainRepository, StateAccess};
use parking_lot::{Mutex, RwLock};
use shared_crypto::Hasher;
use shared_types::{Block, ChainError, Hash, Log, Receipt};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

type StateMap = BTreeMap<Hash, Hash>;

#[derive(Default)]
struct ChainStore {
    blocks: HashMap<Hash, Block>,
    receipts: HashMap<Hash, Vec<Receipt>>,
    states: HashMap<Hash, Arc<StateMap>>,
    head: Hash,
}

impl ChainStore {
    fn head_block(&self) -> Result<&Block, ChainError> {
        self.blocks.get(&self.head).ok_or(ChainError::Empty)
    }

    fn head_height(&self) -> u64 {
        self.head_block().map(|b| b.header.height).unwrap_or(0)
    }
}

/// Shared in-memory chain. Cloning shares the store.
#[derive(Clone)]
pub struct MemoryChain {
    store: Arc<RwLock<ChainStore>>,
    hasher: Hasher,
}

impl MemoryChain {
    /// Start a chain at `genesis` with an empty state.
    pub fn new(genesis: Block, hasher: Hasher) -> Self {
        let mut store = ChainStore {
            head: genesis.header_hash,
            ..Default::default()
        };
        store.states.insert(genesis.header_hash, Arc::new(StateMap::new()));
        store.receipts.insert(genesis.header_hash, Vec::new());
        store.blocks.insert(genesis.header_hash, genesis);
        Self {
            store: Arc::new(RwLock::new(store)),
            hasher,
        }
    }

    pub fn hasher(&self) -> Hasher {
        self.hasher
    }

    /// Highest stored block.
    pub fn head(&self) -> Result<Block, ChainError> {
        self.store.read().head_block().cloned()
    }

    pub fn height(&self) -> u64 {
        self.store.read().head_height()
    }

    pub fn block(&self, hash: &Hash) -> Option<Block> {
        self.store.read().blocks.get(hash).cloned()
    }

    pub fn has_block(&self, hash: &Hash) -> bool {
        self.store.read().blocks.contains_key(hash)
    }

    pub fn receipts(&self, block_hash: &Hash) -> Option<Vec<Receipt>> {
        self.store.read().receipts.get(block_hash).cloned()
    }

    pub fn block_count(&self) -> usize {
        self.store.read().blocks.len()
    }

    /// State slot as of `block_hash`.
    pub fn state_value(&self, block_hash: &Hash, key: &Hash) -> Option<Hash> {
        self.store
            .read()
            .states
            .get(block_hash)
            .and_then(|state| state.get(key).copied())
    }
}

impl ChainProvider for MemoryChain {
    fn state_at(&self, block_hash: &Hash) -> Result<Arc<dyn ChainRepository>, ChainError> {
        let base = self
            .store
            .read()
            .states
            .get(block_hash)
            .cloned()
            .ok_or_else(|| ChainError::StateNotFound(hex::encode(block_hash)))?;

        Ok(Arc::new(MemoryChainView {
            store: self.store.clone(),
            hasher: self.hasher,
            root: *block_hash,
            state: Mutex::new(ViewState {
                base,
                pending: StateMap::new(),
            }),
            logs: Mutex::new(LogState::default()),
        }))
    }
}

struct ViewState {
    base: Arc<StateMap>,
    pending: StateMap,
}

impl ViewState {
    fn merged(&self) -> StateMap {
        let mut merged = (*self.base).clone();
        merged.extend(self.pending.iter().map(|(k, v)| (*k, *v)));
        merged
    }
}

#[derive(Default)]
struct LogState {
    tx_hash: Hash,
    block_hash: Hash,
    tx_index: u32,
    next_index: u32,
    by_tx: HashMap<Hash, Vec<Log>>,
}

/// A view of [`MemoryChain`] rooted at one block's state.
pub struct MemoryChainView {
    store: Arc<RwLock<ChainStore>>,
    hasher: Hasher,
    root: Hash,
    state: Mutex<ViewState>,
    logs: Mutex<LogState>,
}

impl MemoryChainView {
    /// Block whose state this view started from.
    pub fn root(&self) -> Hash {
        self.root
    }

    fn state_root(&self, state: &StateMap) -> Hash {
        let leaves: Vec<Hash> = state
            .iter()
            .map(|(k, v)| self.hasher.hash_many(&[k.as_slice(), v.as_slice()]))
            .collect();
        compute_merkle_root(&self.hasher, &leaves)
    }
}

impl StateAccess for MemoryChainView {
    fn get_state(&self, key: &Hash) -> Option<Hash> {
        let state = self.state.lock();
        state
            .pending
            .get(key)
            .or_else(|| state.base.get(key))
            .copied()
    }

    fn set_state(&self, key: Hash, value: Hash) {
        self.state.lock().pending.insert(key, value);
    }

    fn add_log(&self, mut log: Log) {
        let mut logs = self.logs.lock();
        log.tx_hash = logs.tx_hash;
        log.block_hash = logs.block_hash;
        log.tx_index = logs.tx_index;
        log.index = logs.next_index;
        logs.next_index = logs.next_index.saturating_add(1);
        let tx_hash = logs.tx_hash;
        logs.by_tx.entry(tx_hash).or_default().push(log);
    }
}

impl ChainRepository for MemoryChainView {
    fn get_block_by_hash(&self, hash: &Hash) -> Result<Block, ChainError> {
        self.store
            .read()
            .blocks
            .get(hash)
            .cloned()
            .ok_or_else(|| ChainError::BlockNotFound(hex::encode(hash)))
    }

    fn current_block(&self) -> Result<Block, ChainError> {
        self.store.read().head_block().cloned()
    }

    fn current_height(&self) -> u64 {
        self.store.read().head_height()
    }

    fn has_block(&self, hash: &Hash) -> bool {
        self.store.read().blocks.contains_key(hash)
    }

    fn intermediate_root(&self, commit: bool) -> Hash {
        let mut state = self.state.lock();
        let merged = state.merged();
        let root = self.state_root(&merged);
        if commit {
            state.base = Arc::new(merged);
            state.pending.clear();
        }
        root
    }

    fn prepare(&self, tx_hash: Hash, block_hash: Hash, tx_index: usize) {
        let mut logs = self.logs.lock();
        logs.tx_hash = tx_hash;
        logs.block_hash = block_hash;
        logs.tx_index = u32::try_from(tx_index).unwrap_or(u32::MAX);
    }

    fn get_logs(&self, tx_hash: &Hash) -> Vec<Log> {
        self.logs.lock().by_tx.get(tx_hash).cloned().unwrap_or_default()
    }

    fn write_block_with_receipts(&self, block: &Block, receipts: &[Receipt]) -> Result<(), ChainError> {
        let snapshot = Arc::new(self.state.lock().merged());
        let mut store = self.store.write();

        if !store.blocks.contains_key(&block.header.prev_block_hash) {
            return Err(ChainError::ParentNotFound {
                height: block.header.height,
            });
        }

        let hash = block.header_hash;
        store.blocks.insert(hash, block.clone());
        store.receipts.insert(hash, receipts.to_vec());
        store.states.insert(hash, snapshot);

        if block.header.height > store.head_height() {
            store.head = hash;
            info!(height = block.header.height, hash = %hex::encode(hash), "Chain head advanced");
        } else {
            debug!(height = block.header.height, hash = %hex::encode(hash), "Stored side block");
        }
        Ok(())
    }
}
