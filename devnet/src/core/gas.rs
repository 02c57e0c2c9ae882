use primitive_types::U256;
use tokenbench_common::config::{
    BASE_FEE_MAX_CHANGE_DENOMINATOR, ELASTICITY_MULTIPLIER, TX_BASE_GAS, TX_CREATE_GAS,
    TX_DATA_NON_ZERO_GAS, TX_DATA_ZERO_GAS,
};

use super::error::ExecutionError;

/// Gas charged before any execution: base cost, creation cost and calldata
pub fn intrinsic_gas(data: &[u8], is_create: bool) -> u64 {
    let zeros = data.iter().filter(|b| **b == 0).count() as u64;
    let non_zeros = data.len() as u64 - zeros;

    let mut gas = TX_BASE_GAS + zeros * TX_DATA_ZERO_GAS + non_zeros * TX_DATA_NON_ZERO_GAS;
    if is_create {
        gas += TX_CREATE_GAS;
    }
    gas
}

/// Base fee of the block following `parent`.
///
/// The fee moves by at most 1/8 per block, toward keeping blocks half full.
pub fn next_base_fee(parent_base_fee: U256, parent_gas_used: u64, parent_gas_limit: u64) -> U256 {
    let target = parent_gas_limit / ELASTICITY_MULTIPLIER;
    if target == 0 || parent_gas_used == target {
        return parent_base_fee;
    }

    let denominator = U256::from(target) * U256::from(BASE_FEE_MAX_CHANGE_DENOMINATOR);
    if parent_gas_used > target {
        let delta = parent_base_fee * U256::from(parent_gas_used - target) / denominator;
        parent_base_fee + delta.max(U256::one())
    } else {
        let delta = parent_base_fee * U256::from(target - parent_gas_used) / denominator;
        parent_base_fee.saturating_sub(delta)
    }
}

/// Tracks the gas consumed by one transaction against its limit
#[derive(Debug, Clone)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    pub fn charge(&mut self, amount: u64) -> Result<(), ExecutionError> {
        let used = self.used.saturating_add(amount);
        if used > self.limit {
            self.used = self.limit;
            return Err(ExecutionError::OutOfGas);
        }
        self.used = used;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}
