// File: testing-framework/src/contract/mod.rs
//
// Contract handles
//
// A ContractFactory deploys an artifact from a signer; a Contract is the
// handle to one deployed instance. Calls are encoded from the contract ABI
// (the "interface") and sent through the handle's signer.

mod token;

pub use token::Token;

use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;
use tokenbench_common::{
    abi::Value,
    crypto::Address,
    transaction::{Receipt, Transaction, TransactionRequest},
    U256,
};
use tokenbench_devnet::contracts::ContractArtifact;

use crate::signer::Signer;

/// ABI of a contract, used to encode calls and decode results and logs
pub use tokenbench_common::abi::Abi as Interface;

/// Optional transaction fields applied on top of an encoded call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Explicit gas limit, estimated when absent
    pub gas_limit: Option<u64>,
    /// Legacy gas price
    pub gas_price: Option<U256>,
    /// EIP-1559 tip
    pub max_priority_fee_per_gas: Option<U256>,
    /// EIP-1559 fee cap
    pub max_fee_per_gas: Option<U256>,
    /// Native coin sent along
    pub value: Option<U256>,
    /// Explicit nonce
    pub nonce: Option<u64>,
}

impl Overrides {
    /// No override
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gas limit
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Set a legacy gas price
    pub fn gas_price(mut self, gas_price: impl Into<U256>) -> Self {
        self.gas_price = Some(gas_price.into());
        self
    }

    /// Set the EIP-1559 tip
    pub fn max_priority_fee_per_gas(mut self, fee: impl Into<U256>) -> Self {
        self.max_priority_fee_per_gas = Some(fee.into());
        self
    }

    /// Set the EIP-1559 fee cap
    pub fn max_fee_per_gas(mut self, fee: impl Into<U256>) -> Self {
        self.max_fee_per_gas = Some(fee.into());
        self
    }

    /// Attach native coin
    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the nonce
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Copy the set fields into a request
    pub fn apply(&self, mut request: TransactionRequest) -> TransactionRequest {
        request.gas_limit = self.gas_limit.or(request.gas_limit);
        request.gas_price = self.gas_price.or(request.gas_price);
        request.max_priority_fee_per_gas = self
            .max_priority_fee_per_gas
            .or(request.max_priority_fee_per_gas);
        request.max_fee_per_gas = self.max_fee_per_gas.or(request.max_fee_per_gas);
        request.nonce = self.nonce.or(request.nonce);
        if let Some(value) = self.value {
            request.value = value;
        }
        request
    }
}

/// A mined state-changing call together with its receipt
#[derive(Debug, Clone)]
pub struct ContractTransaction {
    transaction: Transaction,
    receipt: Receipt,
}

impl ContractTransaction {
    /// Fetch the receipt of a mined transaction
    pub async fn mined(signer: &Signer, transaction: Transaction) -> Result<Self> {
        let receipt = signer
            .provider()
            .transaction_receipt(&transaction.hash)
            .await?
            .with_context(|| format!("No receipt for transaction {}", transaction.hash))?;
        Ok(Self {
            transaction,
            receipt,
        })
    }

    /// The transaction as recorded by the chain
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Receipt of the transaction
    pub fn receipt(&self) -> &Receipt {
        &self.receipt
    }

    /// Decode every `event` log emitted by `contract` in this transaction
    pub fn events(&self, contract: &Contract, event: &str) -> Result<Vec<Vec<Value>>> {
        let event = contract.interface().event(event)?;
        let topic = event.topic();
        self.receipt
            .logs_from(&contract.address())
            .filter(|log| log.topics.first() == Some(&topic))
            .map(|log| {
                event
                    .decode_log(&log.topics, &log.data)
                    .map_err(anyhow::Error::from)
            })
            .collect()
    }
}

/// Handle to a deployed contract
#[derive(Clone, Debug)]
pub struct Contract {
    address: Address,
    interface: Arc<Interface>,
    signer: Signer,
    deployment: Option<Transaction>,
}

impl Contract {
    /// Bind an interface to an address, sending from `signer`
    pub fn new(address: Address, interface: Arc<Interface>, signer: Signer) -> Self {
        Self {
            address,
            interface,
            signer,
            deployment: None,
        }
    }

    /// Address of the contract
    pub fn address(&self) -> Address {
        self.address
    }

    /// ABI of the contract
    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// Signer used for calls
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Same contract, calls sent from another signer
    pub fn connect(&self, signer: &Signer) -> Self {
        Self {
            signer: signer.clone(),
            ..self.clone()
        }
    }

    /// Creation transaction, when this handle comes from a deployment
    pub fn deployment_transaction(&self) -> Option<&Transaction> {
        self.deployment.as_ref()
    }

    /// Request calling `method` with `args`, without sending it
    pub fn populate_transaction(&self, method: &str, args: &[Value]) -> Result<TransactionRequest> {
        let data = self.interface.encode_function_data(method, args)?;
        Ok(TransactionRequest::new().to(self.address).data(data))
    }

    /// Call a read-only method and decode its outputs
    pub async fn call_view(&self, method: &str, args: &[Value]) -> Result<Vec<Value>> {
        let function = self.interface.function(method)?;
        if !function.is_read_only() {
            bail!("{} is not a view function", function.signature());
        }

        let request = self.populate_transaction(method, args)?;
        let output = self.signer.call(request).await?;
        Ok(function.decode_output(&output)?)
    }

    /// Call a read-only method returning a single value
    pub async fn call_single(&self, method: &str, args: &[Value]) -> Result<Value> {
        let mut values = self.call_view(method, args).await?;
        if values.len() != 1 {
            return Err(anyhow!(
                "{} returned {} values, expected one",
                method,
                values.len()
            ));
        }
        values.pop().context("Empty output")
    }

    /// Send a state-changing call and wait until it is mined
    pub async fn send(
        &self,
        method: &str,
        args: &[Value],
        overrides: Overrides,
    ) -> Result<ContractTransaction> {
        let request = overrides.apply(self.populate_transaction(method, args)?);
        let transaction = self.signer.send_transaction(request).await?;
        ContractTransaction::mined(&self.signer, transaction).await
    }
}

/// Deploys one artifact from one signer
#[derive(Clone, Debug)]
pub struct ContractFactory {
    artifact: ContractArtifact,
    signer: Signer,
}

impl ContractFactory {
    /// Factory for `artifact`, deploying from `signer`
    pub fn new(artifact: ContractArtifact, signer: Signer) -> Self {
        Self { artifact, signer }
    }

    /// ABI of the artifact
    pub fn interface(&self) -> &Interface {
        self.artifact.abi()
    }

    /// Same factory, deploying from another signer
    pub fn connect(&self, signer: &Signer) -> Self {
        Self::new(self.artifact.clone(), signer.clone())
    }

    /// Deploy with constructor `args` and wait until mined
    pub async fn deploy(&self, args: &[Value]) -> Result<Contract> {
        self.deploy_with(args, Overrides::default()).await
    }

    /// Deploy with explicit transaction fields
    pub async fn deploy_with(&self, args: &[Value], overrides: Overrides) -> Result<Contract> {
        let data = self.artifact.deployment_data(args)?;
        let request = overrides.apply(TransactionRequest::new().data(data));
        let transaction = self
            .signer
            .send_transaction(request)
            .await
            .with_context(|| format!("Failed to deploy {}", self.artifact.name()))?;

        let mined = ContractTransaction::mined(&self.signer, transaction).await?;
        let address = mined
            .receipt()
            .contract_address
            .with_context(|| format!("Deployment of {} created no contract", self.artifact.name()))?;

        Ok(Contract {
            deployment: Some(mined.transaction),
            ..self.attach(address)
        })
    }

    /// Handle to an instance already deployed at `address`
    pub fn attach(&self, address: Address) -> Contract {
        Contract::new(address, self.artifact.abi().clone(), self.signer.clone())
    }
}
