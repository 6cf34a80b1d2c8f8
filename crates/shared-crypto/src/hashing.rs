//! # Configurable Hashing
//!
//! One 32-byte hash function chosen at construction.
//!
//! | Algorithm | Name | Notes |
//! |-----------|------|-------|
//! | SHA-256 | `SHA256` | default |
//! | SHA3-256 | `SHA3-256` | |
//! | Keccak-256 | `KECCAK256` | Ethereum-compatible, also used for signing hashes and blooms |
//! | BLAKE3 | `BLAKE3` | SIMD-accelerated |

use crate::CryptoError;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Keccak256, Sha3_256};
use std::fmt;
use std::str::FromStr;

/// 256-bit hash output.
pub type Hash = [u8; 32];

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-256.
    #[default]
    #[serde(rename = "SHA256", alias = "sha256")]
    Sha256,
    /// SHA3-256.
    #[serde(rename = "SHA3-256", alias = "SHA3_256", alias = "sha3-256")]
    Sha3_256,
    /// Keccak-256.
    #[serde(rename = "KECCAK256", alias = "keccak256")]
    Keccak256,
    /// BLAKE3.
    #[serde(rename = "BLAKE3", alias = "blake3")]
    Blake3,
}

impl HashAlgorithm {
    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA256",
            Self::Sha3_256 => "SHA3-256",
            Self::Keccak256 => "KECCAK256",
            Self::Blake3 => "BLAKE3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "SHA256" => Ok(Self::Sha256),
            "SHA3256" | "SHA3" => Ok(Self::Sha3_256),
            "KECCAK256" | "KECCAK" => Ok(Self::Keccak256),
            "BLAKE3" => Ok(Self::Blake3),
            _ => Err(CryptoError::UnknownHashAlgorithm(s.to_string())),
        }
    }
}

/// Stateless hasher bound to one algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hasher {
    algorithm: HashAlgorithm,
}

impl Hasher {
    /// Create a hasher for `algorithm`.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The configured algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash a byte slice.
    pub fn hash(&self, data: &[u8]) -> Hash {
        self.hash_many(&[data])
    }

    /// Hash the concatenation of `parts` without allocating.
    pub fn hash_many(&self, parts: &[&[u8]]) -> Hash {
        match self.algorithm {
            HashAlgorithm::Sha256 => digest_parts::<Sha256>(parts),
            HashAlgorithm::Sha3_256 => digest_parts::<Sha3_256>(parts),
            HashAlgorithm::Keccak256 => digest_parts::<Keccak256>(parts),
            HashAlgorithm::Blake3 => blake3_hash_many(parts),
        }
    }

    /// `H(left || right)`, the merkle parent.
    pub fn hash_pair(&self, left: &Hash, right: &Hash) -> Hash {
        self.hash_many(&[left.as_slice(), right.as_slice()])
    }
}

fn digest_parts<D: Digest>(parts: &[&[u8]]) -> Hash {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Keccak-256 (one-shot).
pub fn keccak256(data: &[u8]) -> Hash {
    digest_parts::<Keccak256>(&[data])
}

/// Hash data with BLAKE3 (one-shot).
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple inputs with BLAKE3.
pub fn blake3_hash_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    *hasher.finalize().as_bytes()
}
