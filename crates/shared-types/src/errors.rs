//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors raised by chain repositories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Block not found by hash.
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    /// No state snapshot for the requested block.
    #[error("State not found for block {0}")]
    StateNotFound(String),

    /// Parent block not found.
    #[error("Parent block not found: cannot write block at height {height}")]
    ParentNotFound { height: u64 },

    /// Chain has no head block yet.
    #[error("Chain is empty")]
    Empty,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}
