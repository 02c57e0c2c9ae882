//! Devnet - shared handle over the chain
//!
//! The chain is a plain synchronous state machine; the node wraps it in a
//! single `RwLock` so transactions are applied one at a time while reads
//! run concurrently.

use async_trait::async_trait;
use log::info;
use primitive_types::U256;
use std::sync::Arc;
use tokenbench_common::{
    crypto::{Address, Hash},
    transaction::{Receipt, Transaction, TransactionRequest},
};
use tokio::sync::RwLock;

use crate::{
    config::{DevnetConfig, Hardfork},
    contracts::{ArtifactRegistry, ContractArtifact},
    core::{
        block::Block,
        blockchain::{Blockchain, SnapshotId},
        error::BlockchainError,
    },
    provider::Provider,
};

pub struct Devnet {
    chain: RwLock<Blockchain>,
}

impl Devnet {
    pub fn new(blockchain: Blockchain) -> Self {
        Self {
            chain: RwLock::new(blockchain),
        }
    }

    pub async fn config(&self) -> DevnetConfig {
        self.chain.read().await.config().clone()
    }

    pub async fn artifact(&self, name: &str) -> Result<ContractArtifact, BlockchainError> {
        self.chain.read().await.artifact(name).cloned()
    }

    /// Base fee the next block will charge
    pub async fn pending_base_fee(&self) -> Option<U256> {
        self.chain.read().await.pending_base_fee()
    }

    /// Name of the contract deployed at `address`
    pub async fn contract_at(&self, address: &Address) -> Option<&'static str> {
        self.chain.read().await.contract_at(address)
    }
}

#[async_trait]
impl Provider for Devnet {
    async fn chain_id(&self) -> Result<u64, BlockchainError> {
        Ok(self.chain.read().await.chain_id())
    }

    async fn accounts(&self) -> Result<Vec<Address>, BlockchainError> {
        Ok(self.chain.read().await.accounts().to_vec())
    }

    async fn block_number(&self) -> Result<u64, BlockchainError> {
        Ok(self.chain.read().await.block_number())
    }

    async fn block(&self, number: u64) -> Result<Option<Block>, BlockchainError> {
        Ok(self.chain.read().await.block(number).cloned())
    }

    async fn balance(&self, address: &Address) -> Result<U256, BlockchainError> {
        Ok(self.chain.read().await.balance(address))
    }

    async fn nonce(&self, address: &Address) -> Result<u64, BlockchainError> {
        Ok(self.chain.read().await.nonce(address))
    }

    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<Transaction, BlockchainError> {
        self.chain.write().await.send_transaction(request)
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64, BlockchainError> {
        self.chain.read().await.estimate_gas(request)
    }

    async fn call(&self, request: &TransactionRequest) -> Result<Vec<u8>, BlockchainError> {
        self.chain.read().await.call(request)
    }

    async fn transaction(&self, hash: &Hash) -> Result<Option<Transaction>, BlockchainError> {
        Ok(self.chain.read().await.transaction(hash).cloned())
    }

    async fn transaction_receipt(&self, hash: &Hash) -> Result<Option<Receipt>, BlockchainError> {
        Ok(self.chain.read().await.receipt(hash).cloned())
    }

    async fn snapshot(&self) -> Result<SnapshotId, BlockchainError> {
        Ok(self.chain.write().await.snapshot())
    }

    async fn revert(&self, id: SnapshotId) -> Result<bool, BlockchainError> {
        Ok(self.chain.write().await.revert(id))
    }

    async fn mine(&self) -> Result<Block, BlockchainError> {
        Ok(self.chain.write().await.mine_block().clone())
    }

    async fn increase_time(&self, seconds: u64) -> Result<u64, BlockchainError> {
        Ok(self.chain.write().await.increase_time(seconds))
    }
}

/// Builder for Devnet instances with fluent API
///
/// # Example
///
/// ```rust,ignore
/// let devnet = DevnetBuilder::new()
///     .with_account_count(5)
///     .with_hardfork(Hardfork::Berlin)
///     .build()?;
/// ```
pub struct DevnetBuilder {
    config: DevnetConfig,
    artifacts: Vec<ContractArtifact>,
}

impl DevnetBuilder {
    /// Default configuration: London, chain 31337, 20 funded accounts
    pub fn new() -> Self {
        Self {
            config: DevnetConfig::default(),
            artifacts: Vec::new(),
        }
    }

    /// Start from a full configuration, e.g. parsed from the command line
    pub fn with_config(mut self, config: DevnetConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.config.chain_id = chain_id;
        self
    }

    pub fn with_account_count(mut self, count: usize) -> Self {
        self.config.account_count = count;
        self
    }

    /// Genesis balance of each account, in wei
    pub fn with_account_balance(mut self, balance: u128) -> Self {
        self.config.account_balance = balance;
        self
    }

    pub fn with_block_gas_limit(mut self, gas_limit: u64) -> Self {
        self.config.block_gas_limit = gas_limit;
        self
    }

    pub fn with_initial_base_fee(mut self, base_fee: u64) -> Self {
        self.config.initial_base_fee = base_fee;
        self
    }

    pub fn with_hardfork(mut self, hardfork: Hardfork) -> Self {
        self.config.hardfork = hardfork;
        self
    }

    /// Make an extra native contract deployable
    pub fn with_artifact(mut self, artifact: ContractArtifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Build the Devnet instance
    ///
    /// # Errors
    ///
    /// Returns an error if a builtin contract interface fails to parse.
    pub fn build(self) -> Result<Devnet, BlockchainError> {
        let mut registry = ArtifactRegistry::builtin()?;
        for artifact in self.artifacts {
            registry.register(artifact);
        }

        info!(
            "Starting devnet with artifacts: {}",
            registry.names().collect::<Vec<_>>().join(", ")
        );
        Ok(Devnet::new(Blockchain::new(self.config, registry)))
    }

    /// Build and wrap in an `Arc`, the form signers and contracts share
    pub fn build_shared(self) -> Result<Arc<Devnet>, BlockchainError> {
        self.build().map(Arc::new)
    }
}

impl Default for DevnetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenbench_common::config::GWEI;

    #[tokio::test]
    async fn test_builder_default() {
        let devnet = DevnetBuilder::new().build().unwrap();

        assert_eq!(devnet.block_number().await.unwrap(), 0);
        assert_eq!(devnet.chain_id().await.unwrap(), 31337);
        assert_eq!(devnet.accounts().await.unwrap().len(), 20);
        assert_eq!(devnet.config().await.hardfork, Hardfork::London);
    }

    #[tokio::test]
    async fn test_builder_overrides() {
        let devnet = DevnetBuilder::new()
            .with_chain_id(1337)
            .with_account_count(2)
            .with_account_balance(5 * GWEI as u128)
            .with_hardfork(Hardfork::Berlin)
            .build()
            .unwrap();

        let accounts = devnet.accounts().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(
            devnet.balance(&accounts[0]).await.unwrap(),
            U256::from(5 * GWEI)
        );
        assert_eq!(devnet.pending_base_fee().await, None);
    }

    #[tokio::test]
    async fn test_provider_round_trip() {
        let devnet = DevnetBuilder::new().build_shared().unwrap();
        let provider: Arc<dyn Provider> = devnet.clone();
        let accounts = provider.accounts().await.unwrap();

        let snapshot = provider.snapshot().await.unwrap();
        let tx = provider
            .send_transaction(
                TransactionRequest::new()
                    .from(accounts[0])
                    .to(accounts[1])
                    .value(U256::from(1u64)),
            )
            .await
            .unwrap();

        let receipt = provider.transaction_receipt(&tx.hash).await.unwrap().unwrap();
        assert!(receipt.succeeded());
        assert_eq!(provider.block_number().await.unwrap(), 1);

        assert!(provider.revert(snapshot).await.unwrap());
        assert_eq!(provider.block_number().await.unwrap(), 0);
        assert!(provider.transaction(&tx.hash).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_artifact() {
        let devnet = DevnetBuilder::new().build().unwrap();
        assert!(devnet.artifact("Token").await.is_ok());
        assert_eq!(
            devnet.artifact("Greeter").await.unwrap_err(),
            BlockchainError::UnknownArtifact("Greeter".to_string())
        );
    }
}
