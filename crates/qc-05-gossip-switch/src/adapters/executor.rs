//! Key/value transaction executor.
//!
//! The payload is a sequence of 64-byte entries, each a 32-byte key
//! followed by a 32-byte value. Every entry becomes one state write and
//! one log. A payload that is not a whole number of entries reverts.
//!
//! Gas: `KV_TX_BASE_GAS + KV_GAS_PER_BYTE * payload.len()`, charged even
//! when the transaction reverts.

use crate::domain::GasPool;
use crate::errors::ExecutionError;
use crate::ports::{ExecutionContext, ExecutionOutcome, StateAccess, TransactionExecutor};
use shared_crypto::keccak256;
use shared_types::{Address, CanonicalEncoder, Hash, Log, TxData};
use tracing::trace;

/// Bytes per key/value entry.
pub const KV_ENTRY_LEN: usize = 64;

/// Flat cost of every transaction.
pub const KV_TX_BASE_GAS: u64 = 1_000;

/// Cost per payload byte.
pub const KV_GAS_PER_BYTE: u64 = 16;

/// Executes key/value write transactions against a chain view.
#[derive(Debug, Clone, Copy, Default)]
pub struct KvExecutor;

impl KvExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Gas charged for `tx` regardless of outcome.
    pub fn intrinsic_gas(tx: &TxData) -> u64 {
        let bytes = u64::try_from(tx.payload.len()).unwrap_or(u64::MAX);
        KV_TX_BASE_GAS.saturating_add(KV_GAS_PER_BYTE.saturating_mul(bytes))
    }
}

/// Address of a contract created by `sender` at `nonce`.
pub fn contract_address(sender: &Address, nonce: u64) -> Address {
    let mut enc = CanonicalEncoder::with_capacity(28);
    enc.put_address(sender).put_u64(nonce);
    let hash = keccak256(enc.as_slice());
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Encode key/value writes as a payload.
pub fn encode_kv_payload(writes: &[(Hash, Hash)]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(writes.len() * KV_ENTRY_LEN);
    for (key, value) in writes {
        payload.extend_from_slice(key);
        payload.extend_from_slice(value);
    }
    payload
}

fn decode_kv_payload(payload: &[u8]) -> Option<Vec<(Hash, Hash)>> {
    if payload.len() % KV_ENTRY_LEN != 0 {
        return None;
    }
    payload
        .chunks_exact(KV_ENTRY_LEN)
        .map(|entry| {
            let key: Hash = entry[..32].try_into().ok()?;
            let value: Hash = entry[32..].try_into().ok()?;
            Some((key, value))
        })
        .collect()
}

impl TransactionExecutor for KvExecutor {
    fn apply(
        &self,
        ctx: &ExecutionContext<'_>,
        gas_pool: &mut GasPool,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let tx = &ctx.tx.data;
        let gas = Self::intrinsic_gas(tx);
        if tx.gas_limit != 0 && tx.gas_limit < gas {
            return Err(ExecutionError::IntrinsicGas {
                required: gas,
                limit: tx.gas_limit,
            });
        }
        gas_pool.sub_gas(gas)?;

        let contract = match tx.recipient {
            Some(_) => None,
            None => Some(contract_address(&tx.from.unwrap_or_default(), tx.account_nonce)),
        };

        let Some(writes) = decode_kv_payload(&tx.payload) else {
            trace!(tx_index = ctx.tx_index, len = tx.payload.len(), "Malformed payload, reverting");
            return Ok(ExecutionOutcome {
                gas_used: gas,
                failed: true,
                ..Default::default()
            });
        };

        let target = tx.recipient.or(contract).unwrap_or_default();
        for (key, value) in writes {
            ctx.chain.set_state(key, value);
            ctx.chain.add_log(Log {
                address: target,
                topics: vec![key],
                data: value.to_vec(),
                ..Default::default()
            });
        }

        Ok(ExecutionOutcome {
            return_data: Vec::new(),
            gas_used: gas,
            failed: false,
            contract_address: contract,
        })
    }
}
