//! Adapters for the outbound ports.
//!
//! In-memory implementations suitable for a single node and for tests.

mod ecdsa;
mod event_sink;
mod executor;
mod memory_chain;

pub use ecdsa::{sign_transaction, EcdsaSenderRecoverer};
pub use event_sink::RecordingEventSink;
pub use executor::{
    contract_address, encode_kv_payload, KvExecutor, KV_ENTRY_LEN, KV_GAS_PER_BYTE, KV_TX_BASE_GAS,
};
pub use memory_chain::{MemoryChain, MemoryChainView};
