//! Content hashes of headers, transactions and receipts.
//!
//! Every hash is `hasher(canonical_encoding)`. The hasher is injected; the
//! default algorithm is SHA-256.

use rayon::prelude::*;
use shared_crypto::Hasher;
use shared_types::{CanonicalEncode, Hash, Header, Receipt, Transaction, ZERO_HASH};

/// Domain tag prepended to the mix digest pre-image.
const MIX_DIGEST_DOMAIN: &[u8] = b"mix-digest";

/// Transactions per block above which leaf hashing runs on rayon.
pub const PARALLEL_HASH_THRESHOLD: usize = 64;

/// Hash of a block header.
pub fn header_hash(hasher: &Hasher, header: &Header) -> Hash {
    hasher.hash(&header.encode())
}

/// Hash of a transaction, memoized on first computation.
pub fn tx_hash(hasher: &Hasher, tx: &Transaction) -> Hash {
    tx.hash_with(|data| hasher.hash(&data.encode()))
}

/// Hashes of `txs` in order.
pub fn tx_hashes(hasher: &Hasher, txs: &[Transaction]) -> Vec<Hash> {
    if txs.len() > PARALLEL_HASH_THRESHOLD {
        txs.par_iter().map(|tx| tx_hash(hasher, tx)).collect()
    } else {
        txs.iter().map(|tx| tx_hash(hasher, tx)).collect()
    }
}

/// Hash of the consensus fields of a receipt.
pub fn receipt_hash(hasher: &Hasher, receipt: &Receipt) -> Hash {
    hasher.hash(&receipt.encode())
}

/// Digest sealed into `mix_digest`: the header with that field zeroed.
pub fn header_digest(hasher: &Hasher, header: &Header) -> Hash {
    let mut unsealed = header.clone();
    unsealed.mix_digest = ZERO_HASH;
    let encoded = unsealed.encode();
    hasher.hash_many(&[MIX_DIGEST_DOMAIN, encoded.as_slice()])
}
