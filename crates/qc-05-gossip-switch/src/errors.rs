//! Error types for the gossip switch.
//!
//! | Layer | Type |
//! |-------|------|
//! | Filter verdict | [`FilterError`] |
//! | Block worker checks | [`ValidationError`] |
//! | Executor | [`ExecutionError`], [`GasError`] |
//! | Sender recovery | [`RecoveryError`] |
//! | Event sink | [`EventError`] |
//! | Ports | [`PortError`] |
//! | Lifecycle and construction | [`SwitchError`], [`ConfigError`] |

use crate::domain::{MessageKind, PortId, SignerScheme};
use shared_crypto::CryptoError;
use shared_types::{Address, ChainError, Hash};
use thiserror::Error;

/// Gas pool exhaustion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GasError {
    #[error("Gas limit reached: requested {requested}, available {available}")]
    LimitReached { requested: u64, available: u64 },
}

/// Errors returned by a transaction executor.
///
/// A transaction that merely reverts is not an error; it is reported as a
/// failed outcome and still produces a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Gas(#[from] GasError),

    #[error("Intrinsic gas too low: need {required}, limit {limit}")]
    IntrinsicGas { required: u64, limit: u64 },

    #[error("State access failed: {0}")]
    State(#[from] ChainError),

    #[error("Execution aborted: {0}")]
    Aborted(String),
}

/// Errors recovering a transaction sender.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("Invalid signature value v={v} for {scheme} signer")]
    InvalidV { v: u64, scheme: SignerScheme },

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// A failed block check. Variants follow the worker's check order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Failed to get previous block {}: {source}", hex::encode(.parent))]
    NoParent {
        parent: Hash,
        #[source]
        source: ChainError,
    },

    #[error("Wrong chain id: expected {expected}, got {got}")]
    ChainMismatch { expected: u64, got: u64 },

    #[error("Wrong previous block hash: expected {}, got {}", hex::encode(.expected), hex::encode(.got))]
    LinkMismatch { expected: Hash, got: Hash },

    #[error("Wrong height: expected {expected}, got {got}")]
    HeightMismatch { expected: u64, got: u64 },

    #[error("Wrong tx root: expected {}, got {}", hex::encode(.expected), hex::encode(.got))]
    TxRootMismatch { expected: Hash, got: Hash },

    #[error("Wrong header hash: expected {}, got {}", hex::encode(.expected), hex::encode(.got))]
    HeaderMismatch { expected: Hash, got: Hash },

    #[error("Transaction {index} signature verification failed: {reason}")]
    TxSignature { index: usize, reason: String },

    #[error("Transaction {index} execution failed: {source}")]
    Execution {
        index: usize,
        #[source]
        source: ExecutionError,
    },

    #[error("Receipts root not consistent: expected {}, got {}", hex::encode(.expected), hex::encode(.got))]
    ReceiptsMismatch { expected: Hash, got: Hash },

    #[error("State root is inconsistent: computed {}, declared {}", hex::encode(.expected), hex::encode(.got))]
    StateRootMismatch { expected: Hash, got: Hash },

    #[error("Digest not consistent: computed {}, declared {}", hex::encode(.expected), hex::encode(.got))]
    DigestMismatch { expected: Hash, got: Hash },

    #[error("Worker already ran")]
    AlreadyRun,
}

/// Verdict of a switch filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Unsupported message type: expected {expected:?}, got {got:?}")]
    UnsupportedMessage { expected: MessageKind, got: MessageKind },

    #[error("Block header hash {} is not the expected {}", hex::encode(.computed), hex::encode(.declared))]
    HeaderHashMismatch { computed: Hash, declared: Hash },

    #[error("Failed to get previous block state {}: {source}", hex::encode(.parent))]
    MissingParentState {
        parent: Hash,
        #[source]
        source: ChainError,
    },

    #[error("Block already exists: height {height}, current height {current_height}")]
    BlockExists { height: u64, current_height: u64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to persist block: {0}")]
    Persist(#[source] ChainError),

    #[error("Failed to recover sender: {0}")]
    SenderRecovery(#[from] RecoveryError),

    #[error("Transaction has no declared sender")]
    MissingSender,

    #[error("Transaction signature verify failed: declared {}, recovered {}", hex::encode(.declared), hex::encode(.recovered))]
    SenderMismatch { declared: Address, recovered: Address },
}

/// Event sink failures. Filters log these and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("No subscribers for event")]
    NoSubscribers,

    #[error("Event sink closed")]
    Closed,
}

/// Port failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("Port {port} is closed")]
    Closed { port: PortId },

    #[error("Port {port}: {failed} of {total} subscribers failed, first: {first}")]
    SubscriberFailures {
        port: PortId,
        failed: usize,
        total: usize,
        first: String,
    },
}

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Switch lifecycle and construction failures.
#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("Switch already started")]
    AlreadyStarted,

    #[error("Switch already stopped")]
    AlreadyStopped,

    #[error("Unsupported switch type: {0}")]
    UnsupportedSwitchType(String),

    #[error("Block switch requires a {0}")]
    MissingCollaborator(&'static str),

    #[error("Switch must be started inside a tokio runtime")]
    NoRuntime,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type FilterResult<T> = Result<T, FilterError>;
pub type SwitchResult<T> = Result<T, SwitchError>;
