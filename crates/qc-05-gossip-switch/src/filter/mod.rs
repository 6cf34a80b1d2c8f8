//! Switch filters: the validators a gossip switch runs before broadcasting.
//!
//! - [`TxFilter`]: sender signature check for transactions
//! - [`BlockFilter`]: full block validation through a [`Worker`]

mod block;
mod seal;
mod transaction;
mod worker;

pub use block::BlockFilter;
pub use seal::{genesis_block, seal_block};
pub use transaction::TxFilter;
pub use worker::{Worker, WorkerOptions};
