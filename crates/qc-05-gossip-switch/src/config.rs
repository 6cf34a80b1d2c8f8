//! Switch configuration.

use crate::domain::DEFAULT_BLOCK_GAS_LIMIT;
use crate::errors::{ConfigError, SwitchError};
use serde::{Deserialize, Serialize};
use shared_crypto::HashAlgorithm;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Which filter a switch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchType {
    #[serde(alias = "tx")]
    Transaction,
    Block,
}

impl fmt::Display for SwitchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction => f.write_str("transaction"),
            Self::Block => f.write_str("block"),
        }
    }
}

impl FromStr for SwitchType {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transaction" | "tx" | "0" => Ok(Self::Transaction),
            "block" | "1" => Ok(Self::Block),
            _ => Err(SwitchError::UnsupportedSwitchType(s.to_string())),
        }
    }
}

impl TryFrom<u8> for SwitchType {
    type Error = SwitchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Transaction),
            1 => Ok(Self::Block),
            other => Err(SwitchError::UnsupportedSwitchType(other.to_string())),
        }
    }
}

/// Construction parameters for a gossip switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    pub switch_type: SwitchType,

    /// Check declared senders against signatures.
    pub verify_signature: bool,

    /// Chain id for transaction signatures. 0 selects the plain scheme.
    pub chain_id: u64,

    /// Algorithm for header, transaction and merkle hashes.
    pub hash_algorithm: HashAlgorithm,

    /// Gas available to replay one block.
    pub block_gas_limit: u64,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            switch_type: SwitchType::Transaction,
            verify_signature: true,
            chain_id: 0,
            hash_algorithm: HashAlgorithm::default(),
            block_gas_limit: DEFAULT_BLOCK_GAS_LIMIT,
        }
    }
}

impl SwitchConfig {
    pub fn transaction() -> Self {
        Self::default()
    }

    pub fn block() -> Self {
        Self {
            switch_type: SwitchType::Block,
            ..Self::default()
        }
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_SWITCH_TYPE`: `transaction`/`tx`/`0` or `block`/`1` (default: transaction)
    /// - `QC_SWITCH_VERIFY_SIGNATURE`: check signatures (default: true)
    /// - `QC_SWITCH_CHAIN_ID`: signature chain id (default: 0)
    /// - `QC_HASH_ALG`: `SHA256`, `SHA3-256`, `KECCAK256` or `BLAKE3` (default: SHA256)
    /// - `QC_SWITCH_GAS_LIMIT`: block replay gas (default: 65536)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            switch_type: match env::var("QC_SWITCH_TYPE") {
                Ok(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "QC_SWITCH_TYPE",
                    value: v,
                })?,
                Err(_) => defaults.switch_type,
            },

            verify_signature: env::var("QC_SWITCH_VERIFY_SIGNATURE")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.verify_signature),

            chain_id: parse_var("QC_SWITCH_CHAIN_ID")?.unwrap_or(defaults.chain_id),

            hash_algorithm: parse_var("QC_HASH_ALG")?.unwrap_or(defaults.hash_algorithm),

            block_gas_limit: parse_var("QC_SWITCH_GAS_LIMIT")?.unwrap_or(defaults.block_gas_limit),
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(None),
    }
}
