//! # Shared Types Crate
//!
//! Chain entities shared by the gossip switch, its event bus and its
//! collaborators.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Header`, `Block`, `Transaction`, `Receipt`
//!   and `Log` are defined once here.
//! - **Canonical Encoding**: every hashed structure has exactly one byte
//!   pre-image (see [`encoding`]).

pub mod encoding;
pub mod entities;
pub mod errors;

pub use encoding::{encode_unsigned_tx, CanonicalEncode, CanonicalEncoder};
pub use entities::*;
pub use errors::*;
