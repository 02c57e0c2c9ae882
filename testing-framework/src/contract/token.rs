use anyhow::{Context, Result};
use tokenbench_common::{abi::Value, crypto::Address, U256};

use super::{Contract, ContractFactory, ContractTransaction, Overrides};
use crate::signer::Signer;

/// Typed handle over the `Token` contract
#[derive(Clone, Debug)]
pub struct Token {
    contract: Contract,
}

impl Token {
    /// Artifact name of the contract
    pub const ARTIFACT: &'static str = "Token";

    /// Deploy a new token from the factory signer, who becomes the owner
    pub async fn deploy(factory: &ContractFactory) -> Result<Self> {
        Ok(Self::attach(factory.deploy(&[]).await?))
    }

    /// Wrap an existing handle
    pub fn attach(contract: Contract) -> Self {
        Self { contract }
    }

    /// Underlying untyped handle
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Address of the token
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    /// Same token, transfers sent from another signer
    pub fn connect(&self, signer: &Signer) -> Self {
        Self::attach(self.contract.connect(signer))
    }

    async fn uint(&self, method: &str, args: &[Value]) -> Result<U256> {
        self.contract
            .call_single(method, args)
            .await?
            .as_uint()
            .with_context(|| format!("{} did not return an integer", method))
    }

    async fn string(&self, method: &str) -> Result<String> {
        self.contract
            .call_single(method, &[])
            .await?
            .into_string()
            .with_context(|| format!("{} did not return a string", method))
    }

    /// Token name
    pub async fn name(&self) -> Result<String> {
        self.string("name").await
    }

    /// Token symbol
    pub async fn symbol(&self) -> Result<String> {
        self.string("symbol").await
    }

    /// Account that deployed the token
    pub async fn owner(&self) -> Result<Address> {
        self.contract
            .call_single("owner", &[])
            .await?
            .as_address()
            .context("owner did not return an address")
    }

    /// Fixed supply minted to the owner
    pub async fn total_supply(&self) -> Result<U256> {
        self.uint("totalSupply", &[]).await
    }

    /// Token balance of `account`
    pub async fn balance_of(&self, account: &Address) -> Result<U256> {
        self.uint("balanceOf", &[Value::Address(*account)]).await
    }

    /// Transfer from the connected signer
    pub async fn transfer(
        &self,
        to: &Address,
        amount: impl Into<U256>,
    ) -> Result<ContractTransaction> {
        self.transfer_with(to, amount, Overrides::default()).await
    }

    /// Transfer with explicit gas and fee fields
    pub async fn transfer_with(
        &self,
        to: &Address,
        amount: impl Into<U256>,
        overrides: Overrides,
    ) -> Result<ContractTransaction> {
        self.contract
            .send(
                "transfer",
                &[Value::Address(*to), Value::Uint(amount.into())],
                overrides,
            )
            .await
    }
}
