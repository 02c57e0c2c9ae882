// File: testing-framework/src/signer.rs
//
// Signer - an unlocked devnet account bound to a provider
//
// Every request sent through a signer carries its address as `from`; the
// devnet accepts it without a signature.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use tokenbench_common::{
    crypto::Address,
    transaction::{Transaction, TransactionRequest},
    U256,
};
use tokenbench_devnet::Provider;

/// Account able to submit transactions
#[derive(Clone)]
pub struct Signer {
    address: Address,
    provider: Arc<dyn Provider>,
}

impl Signer {
    /// Bind `address` to a provider
    pub fn new(address: Address, provider: Arc<dyn Provider>) -> Self {
        Self { address, provider }
    }

    /// Address transactions are sent from
    pub fn address(&self) -> Address {
        self.address
    }

    /// Provider the signer submits to
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Send a raw transaction from this account and wait until it is mined.
    ///
    /// Fields left empty are filled by the chain. A revert is returned as a
    /// [`tokenbench_devnet::core::error::BlockchainError`] inside the
    /// `anyhow::Error`, so it can be downcast.
    pub async fn send_transaction(&self, request: TransactionRequest) -> Result<Transaction> {
        let request = request.from(self.address);
        Ok(self.provider.send_transaction(request).await?)
    }

    /// Execute a request from this account without mining it
    pub async fn call(&self, request: TransactionRequest) -> Result<Vec<u8>> {
        let request = request.from(self.address);
        Ok(self.provider.call(&request).await?)
    }

    /// Native coin balance, in wei
    pub async fn balance(&self) -> Result<U256> {
        Ok(self.provider.balance(&self.address).await?)
    }

    /// Next nonce of the account
    pub async fn nonce(&self) -> Result<u64> {
        Ok(self.provider.nonce(&self.address).await?)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .finish()
    }
}

impl PartialEq for Signer {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}
