//! Log blooms for receipts.
//!
//! Each log contributes its address and every topic; each input sets three
//! bits selected by `keccak256(input)`.

use shared_crypto::keccak256;
use shared_types::{Bloom, Log, Receipt};

/// Bloom over a list of logs.
pub fn logs_bloom(logs: &[Log]) -> Bloom {
    let mut bloom = Bloom::default();
    for log in logs {
        bloom.accrue_digest(&keccak256(&log.address));
        for topic in &log.topics {
            bloom.accrue_digest(&keccak256(topic));
        }
    }
    bloom
}

/// Union of the log blooms of all `receipts`.
pub fn create_bloom(receipts: &[Receipt]) -> Bloom {
    let mut bloom = Bloom::default();
    for receipt in receipts {
        bloom.union(&logs_bloom(&receipt.logs));
    }
    bloom
}

/// True if `input` may have been added to `bloom`.
pub fn bloom_lookup(bloom: &Bloom, input: &[u8]) -> bool {
    bloom.contains_digest(&keccak256(input))
}
