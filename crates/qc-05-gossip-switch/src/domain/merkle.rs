//! # Merkle Root
//!
//! Binary merkle tree over an ordered list of leaf hashes.
//!
//! - Leaves are padded with [`SENTINEL_HASH`] to the next power of two; a
//!   single leaf pads to two.
//! - Each parent is `H(left || right)` under the injected hasher.
//! - An empty leaf list has the sentinel as its root.

use shared_crypto::Hasher;
use shared_types::{Hash, ZERO_HASH};

/// Padding leaf and empty-tree root.
pub const SENTINEL_HASH: Hash = ZERO_HASH;

/// Merkle tree stored in array form: `[root, level1..., leaves...]`.
///
/// The parent of node `i` has children at `2i + 1` and `2i + 2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    nodes: Vec<Hash>,
    /// Leaves before padding.
    transaction_count: usize,
    /// Leaves after padding.
    padded_leaf_count: usize,
}

impl MerkleTree {
    /// Build a tree from leaf hashes.
    pub fn build(hasher: &Hasher, leaves: &[Hash]) -> Self {
        let transaction_count = leaves.len();

        if transaction_count == 0 {
            return Self {
                nodes: vec![SENTINEL_HASH],
                transaction_count: 0,
                padded_leaf_count: 0,
            };
        }

        // Minimum of two leaves so a lone leaf still gets hashed.
        let padded_leaf_count = transaction_count.next_power_of_two().max(2);

        let total_nodes = 2 * padded_leaf_count - 1;
        let leaf_start = padded_leaf_count - 1;
        let mut nodes = vec![SENTINEL_HASH; total_nodes];
        nodes[leaf_start..leaf_start + transaction_count].copy_from_slice(leaves);

        for i in (0..leaf_start).rev() {
            nodes[i] = hasher.hash_pair(&nodes[2 * i + 1], &nodes[2 * i + 2]);
        }

        Self {
            nodes,
            transaction_count,
            padded_leaf_count,
        }
    }

    /// Root hash.
    pub fn root(&self) -> Hash {
        self.nodes[0]
    }

    /// Number of real leaves.
    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    /// Number of leaves after padding.
    pub fn leaf_count(&self) -> usize {
        self.padded_leaf_count
    }
}

/// Merkle root of `leaves`.
pub fn compute_merkle_root(hasher: &Hasher, leaves: &[Hash]) -> Hash {
    MerkleTree::build(hasher, leaves).root()
}
