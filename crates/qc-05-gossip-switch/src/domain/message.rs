//! Switch messages and port identifiers.

use serde::{Deserialize, Serialize};
use shared_types::{Block, Transaction};

/// Port identifier. In and out ports have separate id spaces.
pub type PortId = u8;

/// In port receiving locally originated messages.
pub const LOCAL_IN_PORT_ID: PortId = 0;
/// In port receiving messages from peers.
pub const REMOTE_IN_PORT_ID: PortId = 1;
/// Out port delivering to local consumers.
pub const LOCAL_OUT_PORT_ID: PortId = 0;
/// Out port delivering to peers.
pub const REMOTE_OUT_PORT_ID: PortId = 1;

/// A message routed by the switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchMessage {
    Transaction(Transaction),
    Block(Block),
}

/// Discriminator of [`SwitchMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Transaction,
    Block,
}

impl SwitchMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Transaction(_) => MessageKind::Transaction,
            Self::Block(_) => MessageKind::Block,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Block(b) => Some(b),
            Self::Transaction(_) => None,
        }
    }

    pub fn as_transaction(&self) -> Option<&Transaction> {
        match self {
            Self::Transaction(tx) => Some(tx),
            Self::Block(_) => None,
        }
    }
}

impl From<Transaction> for SwitchMessage {
    fn from(tx: Transaction) -> Self {
        Self::Transaction(tx)
    }
}

impl From<Block> for SwitchMessage {
    fn from(block: Block) -> Self {
        Self::Block(block)
    }
}
