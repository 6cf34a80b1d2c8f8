//! Transaction signing schemes.
//!
//! | Scheme | Signing hash pre-image | `v` |
//! |--------|------------------------|-----|
//! | `Frontier` | unsigned fields | `27 + recovery_id` |
//! | `ChainBound(id)` | unsigned fields, `id`, `0`, `0` | `id * 2 + 35 + recovery_id` |
//!
//! The signing hash is always Keccak-256, independent of the block hasher.

use crate::errors::RecoveryError;
use shared_crypto::keccak256;
use shared_types::{encode_unsigned_tx, CanonicalEncoder, Hash, TxData};
use std::fmt;

const FRONTIER_V_BASE: u64 = 27;
const CHAIN_BOUND_V_OFFSET: u64 = 35;

/// Which signature convention a transaction uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignerScheme {
    /// Plain signatures, no replay protection.
    Frontier,
    /// Signatures bound to a chain id.
    ChainBound(u64),
}

impl SignerScheme {
    /// Chain id 0 selects the plain scheme.
    pub fn for_chain(chain_id: u64) -> Self {
        if chain_id == 0 {
            Self::Frontier
        } else {
            Self::ChainBound(chain_id)
        }
    }

    /// Keccak-256 of the scheme's pre-image of `tx`.
    pub fn signing_hash(&self, tx: &TxData) -> Hash {
        let mut enc = CanonicalEncoder::with_capacity(128 + tx.payload.len());
        encode_unsigned_tx(tx, &mut enc);
        if let Self::ChainBound(chain_id) = self {
            enc.put_u64(*chain_id).put_u8(0).put_u8(0);
        }
        keccak256(enc.as_slice())
    }

    /// `v` for a raw recovery id (0 or 1).
    pub fn encode_v(&self, recovery_id: u8) -> u64 {
        let recovery_id = u64::from(recovery_id);
        match self {
            Self::Frontier => FRONTIER_V_BASE + recovery_id,
            Self::ChainBound(chain_id) => chain_id
                .saturating_mul(2)
                .saturating_add(CHAIN_BOUND_V_OFFSET)
                .saturating_add(recovery_id),
        }
    }

    /// Raw recovery id carried by `v`.
    pub fn recovery_id(&self, v: u64) -> Result<u8, RecoveryError> {
        let base = match self {
            Self::Frontier => Some(FRONTIER_V_BASE),
            Self::ChainBound(chain_id) => chain_id
                .checked_mul(2)
                .and_then(|x| x.checked_add(CHAIN_BOUND_V_OFFSET)),
        };
        match base.and_then(|b| v.checked_sub(b)) {
            Some(0) => Ok(0),
            Some(1) => Ok(1),
            _ => Err(RecoveryError::InvalidV { v, scheme: *self }),
        }
    }
}

impl fmt::Display for SignerScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frontier => write!(f, "frontier"),
            Self::ChainBound(id) => write!(f, "chain-bound({id})"),
        }
    }
}
