//! Hexagonal ports: the switch API and the collaborators it depends on.

pub mod inbound;
pub mod outbound;

pub use inbound::{GossipSwitchApi, SwitchFilter};
pub use outbound::{
    ChainProvider, ChainRepository, EventSink, ExecutionContext, ExecutionOutcome,
    SenderRecoverer, StateAccess, TransactionExecutor,
};
