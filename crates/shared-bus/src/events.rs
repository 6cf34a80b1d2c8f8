//! # Switch Events
//!
//! Verification outcomes reported by the gossip switch filters.

use serde::{Deserialize, Serialize};
use shared_types::entities::Hash;

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchEvent {
    // =========================================================================
    // BLOCK SWITCH
    // =========================================================================
    /// A block failed verification and was dropped.
    BlockVerifyFailed {
        /// Declared header hash of the rejected block.
        block_hash: Hash,
        /// Declared height of the rejected block.
        height: u64,
        /// Human-readable failure.
        reason: String,
    },

    /// A block at or below the local chain height arrived again.
    BlockExisted {
        /// Declared header hash of the block.
        block_hash: Hash,
        /// Declared height of the block.
        height: u64,
        /// Height of the local chain head.
        current_height: u64,
    },

    // =========================================================================
    // TRANSACTION SWITCH
    // =========================================================================
    /// A transaction passed verification.
    TxVerifySucceeded {
        /// Hash of the transaction.
        tx_hash: Hash,
    },

    /// A transaction failed verification and was dropped.
    TxVerifyFailed {
        /// Hash of the transaction.
        tx_hash: Hash,
        /// Human-readable failure.
        reason: String,
    },
}

impl SwitchEvent {
    /// Discriminator of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::BlockVerifyFailed { .. } => EventKind::BlockVerifyFailed,
            Self::BlockExisted { .. } => EventKind::BlockExisted,
            Self::TxVerifySucceeded { .. } => EventKind::TxVerifySucceeded,
            Self::TxVerifyFailed { .. } => EventKind::TxVerifyFailed,
        }
    }

    /// Topic this event belongs to.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        self.kind().topic()
    }
}

/// Event discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// See [`SwitchEvent::BlockVerifyFailed`].
    BlockVerifyFailed,
    /// See [`SwitchEvent::BlockExisted`].
    BlockExisted,
    /// See [`SwitchEvent::TxVerifySucceeded`].
    TxVerifySucceeded,
    /// See [`SwitchEvent::TxVerifyFailed`].
    TxVerifyFailed,
}

impl EventKind {
    /// Topic of this kind.
    #[must_use]
    pub fn topic(self) -> EventTopic {
        match self {
            Self::BlockVerifyFailed | Self::BlockExisted => EventTopic::Block,
            Self::TxVerifySucceeded | Self::TxVerifyFailed => EventTopic::Transaction,
        }
    }
}

/// Event topics for filtering subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Block switch events.
    Block,
    /// Transaction switch events.
    Transaction,
    /// All events (wildcard).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to accept. Empty accepts all.
    pub topics: Vec<EventTopic>,
    /// Kinds to accept. Empty accepts all.
    pub kinds: Vec<EventKind>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            kinds: Vec::new(),
        }
    }

    /// Create a filter for specific event kinds.
    #[must_use]
    pub fn kinds(kinds: Vec<EventKind>) -> Self {
        Self {
            topics: Vec::new(),
            kinds,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &SwitchEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let kind_match = self.kinds.is_empty() || self.kinds.contains(&event.kind());

        topic_match && kind_match
    }
}
