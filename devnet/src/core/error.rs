use primitive_types::U256;
use thiserror::Error;
use tokenbench_common::{
    abi::decode_revert_reason,
    crypto::{Address, Hash},
    error::AbiError,
    transaction::{TransactionError, TxType},
};

use crate::config::Hardfork;

/// Failure of a single message inside the executor.
/// Every variant rolls back the state changes of the message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Execution reverted")]
    Revert(Vec<u8>),

    #[error("Out of gas")]
    OutOfGas,

    #[error("Deployment data does not match any known contract")]
    InvalidCode,

    #[error("Insufficient balance to transfer value")]
    InsufficientBalance,
}

impl ExecutionError {
    /// Build a revert carrying an `Error(string)` payload
    pub fn reason(reason: &str) -> Self {
        ExecutionError::Revert(tokenbench_common::abi::encode_revert_reason(reason))
    }

    pub fn revert_data(&self) -> &[u8] {
        match self {
            ExecutionError::Revert(data) => data,
            _ => &[],
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    #[error("{}", revert_message(.reason))]
    Revert {
        reason: Option<String>,
        data: Vec<u8>,
        // Set when the failing transaction was mined
        tx_hash: Option<Hash>,
    },

    #[error("Transaction ran out of gas (gas limit {gas_limit})")]
    OutOfGas {
        gas_limit: u64,
        tx_hash: Option<Hash>,
    },

    #[error("Contract creation failed: {0}")]
    CreationFailed(ExecutionError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("Nonce too {}: expected {expected}, got {got}", nonce_direction(*.expected, *.got))]
    NonceMismatch { expected: u64, got: u64 },

    #[error("Sender {address} doesn't have enough funds: need {need}, have {have}")]
    InsufficientFunds {
        address: Address,
        need: U256,
        have: U256,
    },

    #[error("Fee cap {fee_cap} is lower than the block base fee {base_fee}")]
    FeeCapTooLow { fee_cap: U256, base_fee: U256 },

    #[error("Gas limit {gas_limit} is lower than the intrinsic gas {intrinsic}")]
    IntrinsicGasTooLow { gas_limit: u64, intrinsic: u64 },

    #[error("Gas limit {gas_limit} exceeds the block gas limit {block_gas_limit}")]
    GasLimitExceedsBlock { gas_limit: u64, block_gas_limit: u64 },

    #[error("Transaction type {tx_type} is not supported by hardfork {hardfork}")]
    UnsupportedTxType { tx_type: TxType, hardfork: Hardfork },

    #[error("Unknown contract artifact {0}")]
    UnknownArtifact(String),

    #[error("Unknown account {0}, only unlocked accounts can send transactions")]
    UnknownAccount(Address),

    #[error(transparent)]
    Abi(#[from] AbiError),
}

fn nonce_direction(expected: u64, got: u64) -> &'static str {
    if got < expected {
        "low"
    } else {
        "high"
    }
}

fn revert_message(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!("Transaction reverted with reason '{}'", reason),
        None => "Transaction reverted without a reason".to_string(),
    }
}

impl BlockchainError {
    pub fn from_execution(error: ExecutionError, gas_limit: u64, tx_hash: Option<Hash>) -> Self {
        match error {
            ExecutionError::Revert(data) => BlockchainError::Revert {
                reason: decode_revert_reason(&data),
                data,
                tx_hash,
            },
            ExecutionError::OutOfGas => BlockchainError::OutOfGas { gas_limit, tx_hash },
            other => BlockchainError::CreationFailed(other),
        }
    }

    /// Reason string of an `Error(string)` revert
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            BlockchainError::Revert { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, BlockchainError::Revert { .. })
    }

    /// Hash of the mined transaction that failed, if it got mined
    pub fn tx_hash(&self) -> Option<&Hash> {
        match self {
            BlockchainError::Revert { tx_hash, .. } | BlockchainError::OutOfGas { tx_hash, .. } => {
                tx_hash.as_ref()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_keeps_reason() {
        let error = BlockchainError::from_execution(
            ExecutionError::reason("Not enough tokens"),
            100_000,
            None,
        );
        assert_eq!(error.revert_reason(), Some("Not enough tokens"));
        assert_eq!(
            error.to_string(),
            "Transaction reverted with reason 'Not enough tokens'"
        );
    }

    #[test]
    fn test_revert_without_reason() {
        let error = BlockchainError::from_execution(ExecutionError::Revert(vec![]), 0, None);
        assert!(error.is_revert());
        assert_eq!(error.revert_reason(), None);
        assert_eq!(error.to_string(), "Transaction reverted without a reason");
    }

    #[test]
    fn test_out_of_gas_carries_hash() {
        let error =
            BlockchainError::from_execution(ExecutionError::OutOfGas, 21_000, Some(Hash::max()));
        assert!(!error.is_revert());
        assert_eq!(error.tx_hash(), Some(&Hash::max()));
    }

    #[test]
    fn test_nonce_message() {
        let low = BlockchainError::NonceMismatch {
            expected: 4,
            got: 2,
        };
        assert_eq!(low.to_string(), "Nonce too low: expected 4, got 2");
    }
}
