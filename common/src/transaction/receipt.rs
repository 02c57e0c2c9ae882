use primitive_types::U256;
use serde::{Deserialize, Serialize};

use super::TxType;
use crate::crypto::{Address, Hash};

/// Event emitted by a contract during a transaction
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<Hash>,
    #[serde(with = "hex")]
    pub data: Vec<u8>,
    // Position fields are filled when the transaction is mined
    pub block_number: u64,
    pub transaction_hash: Hash,
    pub transaction_index: u64,
    pub log_index: u64,
}

impl Log {
    pub fn new(address: Address, topics: Vec<Hash>, data: Vec<u8>) -> Self {
        Self {
            address,
            topics,
            data,
            block_number: 0,
            transaction_hash: Hash::zero(),
            transaction_index: 0,
            log_index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ReceiptStatus {
    Reverted,
    Success,
}

impl From<ReceiptStatus> for u8 {
    fn from(status: ReceiptStatus) -> Self {
        match status {
            ReceiptStatus::Reverted => 0,
            ReceiptStatus::Success => 1,
        }
    }
}

impl TryFrom<u8> for ReceiptStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ReceiptStatus::Reverted),
            1 => Ok(ReceiptStatus::Success),
            other => Err(format!("Invalid receipt status {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: Hash,
    pub transaction_index: u64,
    pub block_hash: Hash,
    pub block_number: u64,
    pub from: Address,
    pub to: Option<Address>,
    // Address of the created contract, for deployments only
    pub contract_address: Option<Address>,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub status: ReceiptStatus,
    pub gas_used: u64,
    pub cumulative_gas_used: u64,
    pub effective_gas_price: U256,
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status == ReceiptStatus::Success
    }

    /// Total amount of native coin charged for gas
    pub fn fee_paid(&self) -> U256 {
        self.effective_gas_price * U256::from(self.gas_used)
    }

    /// Logs emitted by one contract
    pub fn logs_from<'a>(&'a self, address: &'a Address) -> impl Iterator<Item = &'a Log> + 'a {
        self.logs.iter().filter(move |log| log.address == *address)
    }
}
