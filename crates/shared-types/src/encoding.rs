//! # Canonical Encoding
//!
//! Deterministic byte pre-image for every hashed structure.
//!
//! Layout rules:
//! - integers are big-endian, fixed width
//! - `U256` is 32 bytes big-endian
//! - optional fields carry a presence byte (0 or 1) before the value
//! - byte strings and lists carry a `u32` big-endian length prefix
//!
//! This is a hash pre-image only, never a wire format.

use crate::entities::{Address, Block, Hash, Header, Log, Receipt, TxData, U256};

/// Append-only canonical byte writer.
#[derive(Debug, Default, Clone)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with a preallocated buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_u256(&mut self, value: &U256) -> &mut Self {
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        self.buf.extend_from_slice(&bytes);
        self
    }

    pub fn put_hash(&mut self, hash: &Hash) -> &mut Self {
        self.buf.extend_from_slice(hash);
        self
    }

    pub fn put_address(&mut self, address: &Address) -> &mut Self {
        self.buf.extend_from_slice(address);
        self
    }

    pub fn put_opt_address(&mut self, address: Option<&Address>) -> &mut Self {
        match address {
            Some(a) => self.put_u8(1).put_address(a),
            None => self.put_u8(0),
        }
    }

    /// Length-prefixed byte string.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.put_len(bytes.len());
        self.buf.extend_from_slice(bytes);
        self
    }

    /// List length prefix.
    pub fn put_len(&mut self, len: usize) -> &mut Self {
        // Lengths beyond u32 cannot occur for in-memory blocks; saturate.
        self.put_u32(u32::try_from(len).unwrap_or(u32::MAX))
    }

    /// Raw bytes with no prefix.
    pub fn put_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Types with a canonical byte encoding.
pub trait CanonicalEncode {
    /// Append the canonical form to `enc`.
    fn encode_into(&self, enc: &mut CanonicalEncoder);

    /// Canonical bytes.
    fn encode(&self) -> Vec<u8> {
        let mut enc = CanonicalEncoder::new();
        self.encode_into(&mut enc);
        enc.finish()
    }
}

impl CanonicalEncode for Header {
    fn encode_into(&self, enc: &mut CanonicalEncoder) {
        enc.put_u64(self.chain_id)
            .put_hash(&self.prev_block_hash)
            .put_u64(self.height)
            .put_hash(&self.state_root)
            .put_hash(&self.tx_root)
            .put_hash(&self.receipts_root)
            .put_hash(&self.mix_digest)
            .put_u64(self.timestamp)
            .put_address(&self.coinbase);
    }
}

impl CanonicalEncode for TxData {
    fn encode_into(&self, enc: &mut CanonicalEncoder) {
        encode_unsigned_tx(self, enc);
        enc.put_opt_address(self.from.as_ref())
            .put_u64(self.v)
            .put_hash(&self.r)
            .put_hash(&self.s);
    }
}

/// Unsigned transaction fields, the pre-image for signing hashes.
pub fn encode_unsigned_tx(tx: &TxData, enc: &mut CanonicalEncoder) {
    enc.put_u64(tx.account_nonce)
        .put_u256(&tx.price)
        .put_u64(tx.gas_limit)
        .put_opt_address(tx.recipient.as_ref())
        .put_u256(&tx.amount)
        .put_bytes(&tx.payload);
}

/// Consensus fields of a log: address, topics, data.
impl CanonicalEncode for Log {
    fn encode_into(&self, enc: &mut CanonicalEncoder) {
        enc.put_address(&self.address).put_len(self.topics.len());
        for topic in &self.topics {
            enc.put_hash(topic);
        }
        enc.put_bytes(&self.data);
    }
}

/// Consensus fields of a receipt: status, cumulative gas, bloom, logs.
impl CanonicalEncode for Receipt {
    fn encode_into(&self, enc: &mut CanonicalEncoder) {
        enc.put_u8(self.status.as_u8())
            .put_u64(self.cumulative_gas_used)
            .put_raw(self.bloom.as_bytes())
            .put_len(self.logs.len());
        for log in &self.logs {
            log.encode_into(enc);
        }
    }
}

impl CanonicalEncode for Block {
    fn encode_into(&self, enc: &mut CanonicalEncoder) {
        self.header.encode_into(enc);
        enc.put_hash(&self.header_hash)
            .put_len(self.transactions.len());
        for tx in &self.transactions {
            tx.data.encode_into(enc);
        }
    }
}
