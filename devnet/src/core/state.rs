use indexmap::IndexMap;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use tokenbench_common::crypto::Address;

use crate::contracts::NativeContract;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub nonce: u64,
    pub balance: U256,
}

/// Accounts and deployed contracts.
///
/// Cloning the world is how the executor gets an undo point: a message runs
/// against a copy, and the copy replaces the original only on success.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    accounts: IndexMap<Address, AccountState>,
    contracts: IndexMap<Address, Box<dyn NativeContract>>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, address: &Address) -> Option<&AccountState> {
        self.accounts.get(address)
    }

    pub fn account_mut(&mut self, address: Address) -> &mut AccountState {
        self.accounts.entry(address).or_default()
    }

    pub fn balance(&self, address: &Address) -> U256 {
        self.accounts
            .get(address)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    pub fn nonce(&self, address: &Address) -> u64 {
        self.accounts
            .get(address)
            .map(|account| account.nonce)
            .unwrap_or_default()
    }

    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.account_mut(address).balance = balance;
    }

    /// Move native coin between accounts, failing without changes if the sender is short
    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> bool {
        if value.is_zero() {
            return true;
        }

        let from_balance = self.balance(&from);
        if from_balance < value {
            return false;
        }
        self.set_balance(from, from_balance - value);
        let to_balance = self.balance(&to);
        self.set_balance(to, to_balance + value);
        true
    }

    pub fn contract_mut(&mut self, address: &Address) -> Option<&mut Box<dyn NativeContract>> {
        self.contracts.get_mut(address)
    }

    pub fn has_contract(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    pub fn contract_name(&self, address: &Address) -> Option<&'static str> {
        self.contracts
            .get(address)
            .map(|contract| contract.artifact_name())
    }

    pub fn insert_contract(&mut self, address: Address, contract: Box<dyn NativeContract>) {
        // A contract account starts at nonce 1
        self.account_mut(address).nonce = 1;
        self.contracts.insert(address, contract);
    }

    /// Sum of every native balance
    pub fn total_balance(&self) -> U256 {
        self.accounts
            .values()
            .fold(U256::zero(), |total, account| total + account.balance)
    }
}
