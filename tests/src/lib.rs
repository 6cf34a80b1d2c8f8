//! # Quantum-Chain Test Suite
//!
//! Cross-crate tests for the gossip switch.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/   # Switch flows across shared-bus, shared-crypto
//! │                      # and the bundled chain and executor adapters
//! └── benches/           # Merkle root and block verification throughput
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qc-tests
//! cargo bench -p qc-tests
//! ```

pub mod fixtures;
pub mod integration;
