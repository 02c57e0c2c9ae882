use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{keccak256, Address, Hash};

mod receipt;
mod version;

pub use receipt::{Log, Receipt, ReceiptStatus};
pub use version::TxType;

#[cfg(test)]
mod tests;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Cannot combine gasPrice with maxPriorityFeePerGas or maxFeePerGas")]
    MixedFeeModels,

    #[error("maxPriorityFeePerGas ({priority}) is greater than maxFeePerGas ({max})")]
    PriorityFeeAboveMaxFee { priority: U256, max: U256 },

    #[error("Chain id mismatch: expected {expected}, got {got}")]
    ChainIdMismatch { expected: u64, got: u64 },

    #[error("Transaction has no sender")]
    MissingSender,
}

/// Which fee fields a request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeKind {
    // No fee field set, the chain picks the model
    Unspecified,
    Legacy,
    Eip1559,
}

/// A transaction as submitted: every field the chain can fill is optional.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, with = "hex")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub value: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

impl TransactionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn gas_price(mut self, gas_price: impl Into<U256>) -> Self {
        self.gas_price = Some(gas_price.into());
        self
    }

    pub fn max_priority_fee_per_gas(mut self, fee: impl Into<U256>) -> Self {
        self.max_priority_fee_per_gas = Some(fee.into());
        self
    }

    pub fn max_fee_per_gas(mut self, fee: impl Into<U256>) -> Self {
        self.max_fee_per_gas = Some(fee.into());
        self
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// Classify the fee fields, rejecting combinations no chain accepts
    pub fn fee_kind(&self) -> Result<FeeKind, TransactionError> {
        let eip1559 =
            self.max_priority_fee_per_gas.is_some() || self.max_fee_per_gas.is_some();

        match (self.gas_price.is_some(), eip1559) {
            (true, true) => Err(TransactionError::MixedFeeModels),
            (true, false) => Ok(FeeKind::Legacy),
            (false, true) => {
                if let (Some(priority), Some(max)) =
                    (self.max_priority_fee_per_gas, self.max_fee_per_gas)
                {
                    if priority > max {
                        return Err(TransactionError::PriorityFeeAboveMaxFee { priority, max });
                    }
                }
                Ok(FeeKind::Eip1559)
            }
            (false, false) => Ok(FeeKind::Unspecified),
        }
    }
}

/// A transaction accepted by the chain.
///
/// Fee fields hold exactly what was submitted (or filled in when absent):
/// `gas_price` for legacy transactions, the two EIP-1559 fields otherwise.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: Hash,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub chain_id: u64,
    pub nonce: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    #[serde(with = "hex")]
    pub data: Vec<u8>,
    pub gas_limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    // Set once mined
    pub block_number: Option<u64>,
    pub block_hash: Option<Hash>,
    pub transaction_index: Option<u64>,
}

impl Transaction {
    /// Highest price per gas the sender agreed to pay
    pub fn fee_cap(&self) -> U256 {
        match self.tx_type {
            TxType::Legacy => self.gas_price.unwrap_or_default(),
            TxType::Eip1559 => self.max_fee_per_gas.unwrap_or_default(),
        }
    }

    /// Price per gas actually paid once the block base fee is known
    pub fn effective_gas_price(&self, base_fee: U256) -> U256 {
        match self.tx_type {
            TxType::Legacy => self.gas_price.unwrap_or_default(),
            TxType::Eip1559 => {
                let max_fee = self.max_fee_per_gas.unwrap_or_default();
                let priority = self.max_priority_fee_per_gas.unwrap_or_default();
                max_fee.min(base_fee.saturating_add(priority))
            }
        }
    }

    /// Deterministic hash over every field except the block placement
    pub fn compute_hash(&self) -> Hash {
        let mut buffer = Vec::with_capacity(256 + self.data.len());
        buffer.push(self.tx_type.into());
        buffer.extend_from_slice(&self.chain_id.to_be_bytes());
        buffer.extend_from_slice(&self.nonce.to_be_bytes());
        buffer.extend_from_slice(self.from.as_bytes());
        match &self.to {
            Some(to) => {
                buffer.push(1);
                buffer.extend_from_slice(to.as_bytes());
            }
            None => buffer.push(0),
        }
        buffer.extend_from_slice(&self.value.to_big_endian());
        buffer.extend_from_slice(&self.gas_limit.to_be_bytes());
        for fee in [
            &self.gas_price,
            &self.max_priority_fee_per_gas,
            &self.max_fee_per_gas,
        ] {
            match fee {
                Some(fee) => {
                    buffer.push(1);
                    buffer.extend_from_slice(&fee.to_big_endian());
                }
                None => buffer.push(0),
            }
        }
        buffer.extend_from_slice(&(self.data.len() as u64).to_be_bytes());
        buffer.extend_from_slice(&self.data);

        keccak256(&buffer)
    }
}
