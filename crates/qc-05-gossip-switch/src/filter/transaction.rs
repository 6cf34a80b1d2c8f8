//! Transaction filter.

use crate::domain::{tx_hash, MessageKind, PortId, SignerScheme, SwitchMessage};
use crate::errors::{FilterError, FilterResult};
use crate::ports::{EventSink, SenderRecoverer, SwitchFilter};
use shared_bus::SwitchEvent;
use shared_crypto::Hasher;
use shared_types::Transaction;
use std::sync::Arc;
use tracing::{debug, warn};

/// Accepts transactions whose declared sender matches their signature.
///
/// Every transaction verdict is reported to the event sink. Messages of
/// the wrong kind are rejected without an event.
pub struct TxFilter {
    events: Arc<dyn EventSink>,
    recoverer: Arc<dyn SenderRecoverer>,
    verify_signature: bool,
    scheme: SignerScheme,
    hasher: Hasher,
}

impl TxFilter {
    pub fn new(
        events: Arc<dyn EventSink>,
        recoverer: Arc<dyn SenderRecoverer>,
        verify_signature: bool,
        chain_id: u64,
        hasher: Hasher,
    ) -> Self {
        Self {
            events,
            recoverer,
            verify_signature,
            scheme: SignerScheme::for_chain(chain_id),
            hasher,
        }
    }

    pub fn scheme(&self) -> SignerScheme {
        self.scheme
    }

    fn check_sender(&self, tx: &Transaction) -> FilterResult<()> {
        let declared = tx.data.from.ok_or(FilterError::MissingSender)?;
        let recovered = self.recoverer.recover_sender(self.scheme, &tx.data)?;
        if recovered != declared {
            return Err(FilterError::SenderMismatch {
                declared,
                recovered,
            });
        }
        Ok(())
    }

    fn notify(&self, event: SwitchEvent) {
        if let Err(e) = self.events.notify(event) {
            warn!(error = %e, "Failed to deliver transaction event");
        }
    }
}

impl SwitchFilter for TxFilter {
    fn verify(&self, port: PortId, msg: &mut SwitchMessage) -> FilterResult<()> {
        let kind = msg.kind();
        let SwitchMessage::Transaction(tx) = msg else {
            return Err(FilterError::UnsupportedMessage {
                expected: MessageKind::Transaction,
                got: kind,
            });
        };

        let hash = tx_hash(&self.hasher, tx);
        let verdict = if self.verify_signature {
            self.check_sender(tx)
        } else {
            Ok(())
        };

        match &verdict {
            Ok(()) => {
                debug!(port, tx_hash = %hex::encode(hash), "Transaction verified");
                self.notify(SwitchEvent::TxVerifySucceeded { tx_hash: hash });
            }
            Err(e) => {
                warn!(port, tx_hash = %hex::encode(hash), error = %e, "Transaction rejected");
                self.notify(SwitchEvent::TxVerifyFailed {
                    tx_hash: hash,
                    reason: e.to_string(),
                });
            }
        }
        verdict
    }
}
