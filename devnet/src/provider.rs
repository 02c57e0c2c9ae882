//! Provider - read and write access to a chain
//!
//! Test code talks to the chain only through this trait, so the same
//! harness can drive the in-process devnet or any other backend.

use async_trait::async_trait;
use primitive_types::U256;
use tokenbench_common::{
    crypto::{Address, Hash},
    transaction::{Receipt, Transaction, TransactionRequest},
};

use crate::core::{block::Block, blockchain::SnapshotId, error::BlockchainError};

/// Chain access used by signers, contracts and fixtures.
///
/// # Errors
///
/// Every method returns [`BlockchainError`] so callers can inspect revert
/// reasons instead of matching on strings.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chain_id(&self) -> Result<u64, BlockchainError>;

    /// Accounts the node can send from without a signature
    async fn accounts(&self) -> Result<Vec<Address>, BlockchainError>;

    async fn block_number(&self) -> Result<u64, BlockchainError>;

    async fn block(&self, number: u64) -> Result<Option<Block>, BlockchainError>;

    async fn balance(&self, address: &Address) -> Result<U256, BlockchainError>;

    /// Number of transactions sent by `address`
    async fn nonce(&self, address: &Address) -> Result<u64, BlockchainError>;

    /// Validate, fill and mine a transaction.
    ///
    /// # Returns
    ///
    /// The transaction as accepted by the chain, with its block placement.
    ///
    /// # Errors
    ///
    /// Validation failures leave the chain untouched. An execution failure
    /// with an explicit gas limit is mined first and then reported with the
    /// transaction hash.
    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<Transaction, BlockchainError>;

    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64, BlockchainError>;

    /// Execute a request against the latest state without mining it
    async fn call(&self, request: &TransactionRequest) -> Result<Vec<u8>, BlockchainError>;

    async fn transaction(&self, hash: &Hash) -> Result<Option<Transaction>, BlockchainError>;

    async fn transaction_receipt(&self, hash: &Hash) -> Result<Option<Receipt>, BlockchainError>;

    /// Capture the full chain state
    async fn snapshot(&self) -> Result<SnapshotId, BlockchainError>;

    /// Restore a snapshot, consuming it and every later one.
    ///
    /// Returns false when the id is unknown or already consumed.
    async fn revert(&self, id: SnapshotId) -> Result<bool, BlockchainError>;

    /// Mine an empty block
    async fn mine(&self) -> Result<Block, BlockchainError>;

    /// Move the clock of the next block forward
    async fn increase_time(&self, seconds: u64) -> Result<u64, BlockchainError>;
}
