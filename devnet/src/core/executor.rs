use log::{debug, trace};
use primitive_types::U256;
use tokenbench_common::{
    config::CODE_DEPOSIT_GAS,
    crypto::{keccak256, Address},
    transaction::{Log, ReceiptStatus, Transaction},
};

use super::{
    error::ExecutionError,
    gas::{intrinsic_gas, GasMeter},
    state::WorldState,
};
use crate::contracts::{ArtifactRegistry, CallContext};

/// Address of a contract created by `deployer` with the given account nonce
pub fn create_address(deployer: &Address, nonce: u64) -> Address {
    let mut buffer = Vec::with_capacity(28);
    buffer.extend_from_slice(deployer.as_bytes());
    buffer.extend_from_slice(&nonce.to_be_bytes());
    Address::from_hash(&keccak256(&buffer))
}

/// Block values a transaction is priced against
#[derive(Debug, Clone, Copy)]
pub struct BlockEnv {
    pub base_fee: U256,
    pub coinbase: Address,
}

#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub status: ReceiptStatus,
    pub gas_used: u64,
    pub effective_gas_price: U256,
    pub output: Vec<u8>,
    pub logs: Vec<Log>,
    pub contract_address: Option<Address>,
    // Why the message failed, when it did
    pub error: Option<ExecutionError>,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

// Run the message part of a transaction: value transfer plus contract code
fn run_message(
    world: &mut WorldState,
    artifacts: &ArtifactRegistry,
    tx: &Transaction,
    gas: &mut GasMeter,
    logs: &mut Vec<Log>,
) -> Result<(Vec<u8>, Option<Address>), ExecutionError> {
    match tx.to {
        None => {
            let address = create_address(&tx.from, tx.nonce);
            let (artifact, args) = artifacts
                .resolve(&tx.data)
                .ok_or(ExecutionError::InvalidCode)?;
            if !world.transfer(tx.from, address, tx.value) {
                return Err(ExecutionError::InsufficientBalance);
            }

            let contract = {
                let mut ctx = CallContext::new(tx.from, address, tx.value, gas, logs);
                artifact.construct(&mut ctx, args)?
            };
            gas.charge(CODE_DEPOSIT_GAS)?;
            world.insert_contract(address, contract);
            Ok((Vec::new(), Some(address)))
        }
        Some(to) => {
            if !world.transfer(tx.from, to, tx.value) {
                return Err(ExecutionError::InsufficientBalance);
            }

            match world.contract_mut(&to) {
                Some(contract) => {
                    let mut ctx = CallContext::new(tx.from, to, tx.value, gas, logs);
                    let output = contract.call(&mut ctx, &tx.data)?;
                    Ok((output, None))
                }
                // Plain account: data is ignored
                None => {
                    world.account_mut(to);
                    Ok((Vec::new(), None))
                }
            }
        }
    }
}

/// Apply a validated transaction to the world.
///
/// The nonce is consumed and the fee charged whatever the outcome. State
/// changes and logs of the message are kept only when it succeeds. The
/// base fee part of the fee is burned and the rest goes to the coinbase.
pub fn apply_transaction(
    world: &mut WorldState,
    artifacts: &ArtifactRegistry,
    env: &BlockEnv,
    tx: &Transaction,
) -> ExecutionOutcome {
    let mut gas = GasMeter::new(tx.gas_limit);
    let mut logs = Vec::new();

    let mut scratch = world.clone();
    let result = gas
        .charge(intrinsic_gas(&tx.data, tx.to.is_none()))
        .and_then(|_| run_message(&mut scratch, artifacts, tx, &mut gas, &mut logs));

    let (status, output, contract_address, error) = match result {
        Ok((output, contract_address)) => {
            *world = scratch;
            (ReceiptStatus::Success, output, contract_address, None)
        }
        Err(error) => {
            if log::log_enabled!(log::Level::Debug) {
                debug!("Transaction {} failed: {}", tx.hash, error);
            }
            logs.clear();
            (
                ReceiptStatus::Reverted,
                error.revert_data().to_vec(),
                None,
                Some(error),
            )
        }
    };

    let gas_used = gas.used();
    let effective_gas_price = tx.effective_gas_price(env.base_fee);
    let fee = effective_gas_price * U256::from(gas_used);
    let tip = effective_gas_price.saturating_sub(env.base_fee) * U256::from(gas_used);

    let sender = world.account_mut(tx.from);
    sender.nonce += 1;
    sender.balance = sender.balance.saturating_sub(fee);
    let coinbase = world.account_mut(env.coinbase);
    coinbase.balance = coinbase.balance + tip;

    if log::log_enabled!(log::Level::Trace) {
        trace!(
            "Transaction {} used {} gas at {} wei, fee {} wei, tip {} wei",
            tx.hash,
            gas_used,
            effective_gas_price,
            fee,
            tip
        );
    }

    ExecutionOutcome {
        status,
        gas_used,
        effective_gas_price,
        output,
        logs,
        contract_address,
        error,
    }
}

/// Execute a message without committing anything, returning its output and gas used
pub fn simulate(
    world: &WorldState,
    artifacts: &ArtifactRegistry,
    tx: &Transaction,
) -> Result<(Vec<u8>, u64), ExecutionError> {
    let mut gas = GasMeter::new(tx.gas_limit);
    let mut logs = Vec::new();
    let mut scratch = world.clone();

    gas.charge(intrinsic_gas(&tx.data, tx.to.is_none()))?;
    let (output, _) = run_message(&mut scratch, artifacts, tx, &mut gas, &mut logs)?;
    Ok((output, gas.used()))
}
