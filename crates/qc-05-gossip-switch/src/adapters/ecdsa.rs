//! secp256k1 sender recovery.

use crate::domain::SignerScheme;
use crate::errors::RecoveryError;
use crate::ports::SenderRecoverer;
use shared_crypto::{recover_address, CryptoError, Secp256k1KeyPair};
use shared_types::{Address, TxData};

/// Recovers senders from `(v, r, s)` over the scheme's signing hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcdsaSenderRecoverer;

impl SenderRecoverer for EcdsaSenderRecoverer {
    fn recover_sender(&self, scheme: SignerScheme, tx: &TxData) -> Result<Address, RecoveryError> {
        let recovery_id = scheme.recovery_id(tx.v)?;
        let prehash = scheme.signing_hash(tx);
        Ok(recover_address(&prehash, &tx.r, &tx.s, recovery_id)?)
    }
}

/// Sign `tx` under `scheme` and declare the key's address as sender.
pub fn sign_transaction(
    tx: &mut TxData,
    key: &Secp256k1KeyPair,
    scheme: SignerScheme,
) -> Result<(), CryptoError> {
    let signature = key.sign_prehash(&scheme.signing_hash(tx))?;
    tx.r = signature.r;
    tx.s = signature.s;
    tx.v = scheme.encode_v(signature.recovery_id);
    tx.from = Some(key.address());
    Ok(())
}
