//! Block gas budget.

use crate::errors::GasError;

/// Gas limit applied to a block replay when none is configured.
pub const DEFAULT_BLOCK_GAS_LIMIT: u64 = 65_536;

/// Gas available for the remaining transactions of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPool {
    gas: u64,
}

impl GasPool {
    pub fn new(limit: u64) -> Self {
        Self { gas: limit }
    }

    /// Return gas to the pool.
    pub fn add_gas(&mut self, amount: u64) -> &mut Self {
        self.gas = self.gas.saturating_add(amount);
        self
    }

    /// Take `amount` from the pool, failing without change if not enough is left.
    pub fn sub_gas(&mut self, amount: u64) -> Result<(), GasError> {
        if amount > self.gas {
            return Err(GasError::LimitReached {
                requested: amount,
                available: self.gas,
            });
        }
        self.gas -= amount;
        Ok(())
    }

    /// Remaining gas.
    pub fn gas(&self) -> u64 {
        self.gas
    }
}

impl Default for GasPool {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_GAS_LIMIT)
    }
}
