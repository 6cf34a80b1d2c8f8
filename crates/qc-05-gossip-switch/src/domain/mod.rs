//! # Domain Layer for the Gossip Switch
//!
//! Pure logic with no I/O. This is the innermost layer of the hexagonal
//! architecture.
//!
//! ## Contents
//!
//! - **message**: `SwitchMessage`, `MessageKind`, port ids
//! - **hashing**: header, transaction, receipt hashes and the mix digest
//! - **merkle**: merkle roots over transaction and receipt hashes
//! - **bloom**: receipt log blooms
//! - **gas**: per-block `GasPool`
//! - **signing**: `SignerScheme` signing hashes and `v` encoding

mod bloom;
mod gas;
mod hashing;
mod merkle;
mod message;
mod signing;

pub use bloom::*;
pub use gas::*;
pub use hashing::*;
pub use merkle::*;
pub use message::*;
pub use signing::*;
