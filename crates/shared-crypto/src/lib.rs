//! # Shared Crypto - Hashing and Signing Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256, SHA3-256, Keccak-256, BLAKE3 | Header, transaction and merkle hashing |
//! | `ecdsa` | secp256k1 | Transaction signing and sender recovery |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic, low-S normalization (EIP-2)
//! - **Hasher**: algorithm fixed at construction, 32-byte output for all

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{address_from_pubkey, recover_address, RecoverableSignature, Secp256k1KeyPair};
pub use errors::CryptoError;
pub use hashing::{blake3_hash, keccak256, HashAlgorithm, Hasher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
