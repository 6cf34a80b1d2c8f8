//! # Core Domain Entities
//!
//! Chain entities carried through the gossip switch.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `Header`, `Transaction`, `TxData`
//! - **Execution Results**: `Receipt`, `ReceiptStatus`, `Log`, `Bloom`

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::sync::OnceLock;

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte hash (SHA-256, SHA3-256, Keccak-256 or BLAKE3).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// The all-zero hash. Used as "not assigned" for optional header fields
/// and as the merkle padding sentinel.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Returns true if every byte of `hash` is zero.
#[inline]
pub fn is_zero_hash(hash: &Hash) -> bool {
    hash.iter().all(|b| *b == 0)
}

/// The header of a block containing linkage, roots and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Header {
    /// Chain identifier; must match the parent.
    pub chain_id: u64,
    /// Header hash of the parent block.
    pub prev_block_hash: Hash,
    /// Block height in the chain.
    pub height: u64,
    /// State root after applying every transaction.
    pub state_root: Hash,
    /// Merkle root of the transaction hashes.
    pub tx_root: Hash,
    /// Merkle root of the receipt hashes. Zero means "assign on validation".
    pub receipts_root: Hash,
    /// Digest of the header with this field zeroed. Zero skips the check.
    pub mix_digest: Hash,
    /// Unix timestamp when the block was proposed.
    pub timestamp: u64,
    /// Beneficiary of the block.
    pub coinbase: Address,
}

/// A block as it travels through the switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// Declared hash of `header`. Zero means not yet assigned.
    pub header_hash: Hash,
    /// Ordered transactions.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create a block with an unassigned header hash.
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            header_hash: ZERO_HASH,
            transactions,
        }
    }

    /// Block height shortcut.
    pub fn height(&self) -> u64 {
        self.header.height
    }
}

/// Transaction payload and signature fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TxData {
    /// Sender nonce.
    pub account_nonce: u64,
    /// Gas price.
    pub price: U256,
    /// Gas limit.
    pub gas_limit: u64,
    /// Recipient; `None` creates a contract.
    pub recipient: Option<Address>,
    /// Transferred value.
    pub amount: U256,
    /// Call data.
    pub payload: Vec<u8>,
    /// Declared sender, checked against the recovered signer.
    pub from: Option<Address>,
    /// Signature `v` (recovery id, optionally chain-bound).
    pub v: u64,
    /// Signature `r`.
    pub r: [u8; 32],
    /// Signature `s`.
    pub s: [u8; 32],
}

/// A transaction with a write-once memoized hash.
///
/// The hash is computed by the first caller of [`Transaction::hash_with`]
/// and returned unchanged afterwards, even if `data` is later mutated or a
/// different hasher is passed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Transaction {
    /// Payload and signature.
    pub data: TxData,
    #[serde(skip)]
    hash: OnceLock<Hash>,
}

impl Transaction {
    /// Wrap transaction data.
    pub fn new(data: TxData) -> Self {
        Self {
            data,
            hash: OnceLock::new(),
        }
    }

    /// Return the memoized hash, computing it with `compute` on first use.
    pub fn hash_with<F>(&self, compute: F) -> Hash
    where
        F: FnOnce(&TxData) -> Hash,
    {
        *self.hash.get_or_init(|| compute(&self.data))
    }

    /// The memoized hash, if already computed.
    pub fn cached_hash(&self) -> Option<Hash> {
        self.hash.get().copied()
    }

    /// True if the transaction creates a contract.
    pub fn is_contract_creation(&self) -> bool {
        self.data.recipient.is_none()
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Transaction {}

impl From<TxData> for Transaction {
    fn from(data: TxData) -> Self {
        Self::new(data)
    }
}

// =============================================================================
// CLUSTER B: EXECUTION RESULTS
// =============================================================================

/// A log entry emitted during transaction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Log {
    /// Emitting address.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<Hash>,
    /// Unindexed data.
    pub data: Vec<u8>,
    /// Hash of the emitting transaction.
    pub tx_hash: Hash,
    /// Index of the transaction in the block.
    pub tx_index: u32,
    /// Hash of the block being built.
    pub block_hash: Hash,
    /// Index of the log in the block.
    pub index: u32,
}

/// Outcome flag of an executed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReceiptStatus {
    /// Execution reverted or ran out of gas.
    Failed,
    /// Execution completed.
    #[default]
    Successful,
}

impl ReceiptStatus {
    /// Wire byte used in hashing.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Failed => 0,
            Self::Successful => 1,
        }
    }
}

/// Execution receipt of a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Receipt {
    /// Success or failure.
    pub status: ReceiptStatus,
    /// Intermediate state root after this transaction.
    pub post_state: Hash,
    /// Gas used by this and all previous transactions in the block.
    pub cumulative_gas_used: u64,
    /// Gas used by this transaction.
    pub gas_used: u64,
    /// Logs emitted.
    pub logs: Vec<Log>,
    /// Bloom over `logs`.
    pub bloom: Bloom,
    /// Created contract, set when the transaction had no recipient.
    pub contract_address: Option<Address>,
    /// Hash of the transaction.
    pub tx_hash: Hash,
}

impl Receipt {
    /// Create a receipt with the consensus fields set.
    pub fn new(post_state: Hash, failed: bool, cumulative_gas_used: u64) -> Self {
        Self {
            status: if failed {
                ReceiptStatus::Failed
            } else {
                ReceiptStatus::Successful
            },
            post_state,
            cumulative_gas_used,
            ..Default::default()
        }
    }

    /// True if execution failed.
    pub fn failed(&self) -> bool {
        self.status == ReceiptStatus::Failed
    }
}

/// Number of bytes in a [`Bloom`].
pub const BLOOM_BYTE_LENGTH: usize = 256;

const BLOOM_BIT_LENGTH: usize = BLOOM_BYTE_LENGTH * 8;

/// 2048-bit log bloom.
///
/// Bit `n` counts from the least significant bit of the big-endian byte
/// array, so it lives at msb-first index `2047 - n`.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bloom(#[serde_as(as = "Bytes")] pub [u8; BLOOM_BYTE_LENGTH]);

impl Bloom {
    /// Set the three bits selected by `digest`.
    pub fn accrue_digest(&mut self, digest: &Hash) {
        let bits = self.0.view_bits_mut::<Msb0>();
        for n in bloom_bit_positions(digest) {
            bits.set(BLOOM_BIT_LENGTH - 1 - n, true);
        }
    }

    /// True if all three bits selected by `digest` are set.
    pub fn contains_digest(&self, digest: &Hash) -> bool {
        let bits = self.0.view_bits::<Msb0>();
        bloom_bit_positions(digest)
            .into_iter()
            .all(|n| bits[BLOOM_BIT_LENGTH - 1 - n])
    }

    /// Merge `other` into this bloom.
    pub fn union(&mut self, other: &Bloom) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a |= *b;
        }
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.0.view_bits::<Msb0>().count_ones()
    }

    /// True if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.0.view_bits::<Msb0>().not_any()
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; BLOOM_BYTE_LENGTH] {
        &self.0
    }
}

/// Bit positions from byte pairs (0,1), (2,3), (4,5), masked to 11 bits.
fn bloom_bit_positions(digest: &Hash) -> [usize; 3] {
    let mut out = [0usize; 3];
    for (i, slot) in out.iter_mut().enumerate() {
        let hi = digest[2 * i] as usize;
        let lo = digest[2 * i + 1] as usize;
        *slot = ((hi << 8) | lo) & (BLOOM_BIT_LENGTH - 1);
    }
    out
}

impl Default for Bloom {
    fn default() -> Self {
        Self([0u8; BLOOM_BYTE_LENGTH])
    }
}

impl std::fmt::Debug for Bloom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bloom({} bits set)", self.count_ones())
    }
}
