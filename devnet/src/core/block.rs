use primitive_types::U256;
use serde::{Deserialize, Serialize};
use tokenbench_common::crypto::{keccak256, Address, Hash};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: u64,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    // Absent before London
    pub base_fee_per_gas: Option<U256>,
    pub coinbase: Address,
    pub transactions: Vec<Hash>,
}

impl Block {
    pub fn new(
        number: u64,
        parent_hash: Hash,
        timestamp: u64,
        gas_limit: u64,
        gas_used: u64,
        base_fee_per_gas: Option<U256>,
        coinbase: Address,
        transactions: Vec<Hash>,
    ) -> Self {
        let mut block = Self {
            number,
            hash: Hash::zero(),
            parent_hash,
            timestamp,
            gas_limit,
            gas_used,
            base_fee_per_gas,
            coinbase,
            transactions,
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn compute_hash(&self) -> Hash {
        let mut buffer = Vec::with_capacity(160 + self.transactions.len() * 32);
        buffer.extend_from_slice(&self.number.to_be_bytes());
        buffer.extend_from_slice(self.parent_hash.as_bytes());
        buffer.extend_from_slice(&self.timestamp.to_be_bytes());
        buffer.extend_from_slice(&self.gas_limit.to_be_bytes());
        buffer.extend_from_slice(&self.gas_used.to_be_bytes());
        if let Some(base_fee) = &self.base_fee_per_gas {
            buffer.extend_from_slice(&base_fee.to_big_endian());
        }
        buffer.extend_from_slice(self.coinbase.as_bytes());
        for tx in &self.transactions {
            buffer.extend_from_slice(tx.as_bytes());
        }
        keccak256(&buffer)
    }

    /// Base fee used to price the block transactions, zero before London
    pub fn base_fee(&self) -> U256 {
        self.base_fee_per_gas.unwrap_or_default()
    }
}
