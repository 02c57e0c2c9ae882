use indexmap::IndexMap;
use log::{debug, info, warn};
use primitive_types::U256;
use tokenbench_common::{
    config::DEFAULT_PRIORITY_FEE,
    crypto::{keccak256, Address, Hash},
    transaction::{FeeKind, Receipt, Transaction, TransactionError, TransactionRequest, TxType},
    utils::{format_ether, format_gwei},
};

use super::{
    block::Block,
    error::{BlockchainError, ExecutionError},
    executor::{apply_transaction, simulate, BlockEnv},
    gas::{intrinsic_gas, next_base_fee},
    state::WorldState,
};
use crate::{
    config::{DevnetConfig, DEFAULT_COINBASE},
    contracts::{ArtifactRegistry, ContractArtifact},
};

pub type SnapshotId = u64;

// Everything a snapshot captures
#[derive(Debug, Clone)]
struct ChainState {
    world: WorldState,
    blocks: Vec<Block>,
    transactions: IndexMap<Hash, Transaction>,
    receipts: IndexMap<Hash, Receipt>,
    // Seconds added to the next block timestamp
    time_offset: u64,
}

/// Deterministic address of the unlocked account at `index`
pub fn dev_account(index: usize) -> Address {
    Address::from_hash(&keccak256(
        format!("tokenbench devnet account {}", index).as_bytes(),
    ))
}

/// Single-node chain that mines one block per accepted transaction.
///
/// Every account it creates at genesis is unlocked: transactions name their
/// sender and are accepted without a signature.
pub struct Blockchain {
    config: DevnetConfig,
    accounts: Vec<Address>,
    artifacts: ArtifactRegistry,
    state: ChainState,
    snapshots: Vec<(SnapshotId, ChainState)>,
    next_snapshot_id: SnapshotId,
}

impl Blockchain {
    pub fn new(config: DevnetConfig, artifacts: ArtifactRegistry) -> Self {
        let accounts: Vec<Address> = (0..config.account_count).map(dev_account).collect();

        let mut world = WorldState::new();
        for account in &accounts {
            world.set_balance(*account, U256::from(config.account_balance));
        }

        let base_fee = config
            .hardfork
            .supports_eip1559()
            .then(|| U256::from(config.initial_base_fee));
        let genesis = Block::new(
            0,
            Hash::zero(),
            config.genesis_timestamp,
            config.block_gas_limit,
            0,
            base_fee,
            DEFAULT_COINBASE,
            Vec::new(),
        );

        info!(
            "Genesis block {} on chain {} ({}), {} accounts funded with {} each",
            genesis.hash,
            config.chain_id,
            config.hardfork,
            accounts.len(),
            format_ether(U256::from(config.account_balance))
        );

        Self {
            config,
            accounts,
            artifacts,
            state: ChainState {
                world,
                blocks: vec![genesis],
                transactions: IndexMap::new(),
                receipts: IndexMap::new(),
                time_offset: 0,
            },
            snapshots: Vec::new(),
            next_snapshot_id: 1,
        }
    }

    pub fn config(&self) -> &DevnetConfig {
        &self.config
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Unlocked accounts, in derivation order
    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn artifact(&self, name: &str) -> Result<&ContractArtifact, BlockchainError> {
        self.artifacts
            .get(name)
            .ok_or_else(|| BlockchainError::UnknownArtifact(name.to_string()))
    }

    pub fn head(&self) -> &Block {
        // Genesis is never removed
        &self.state.blocks[self.state.blocks.len() - 1]
    }

    pub fn block_number(&self) -> u64 {
        self.head().number
    }

    pub fn block(&self, number: u64) -> Option<&Block> {
        self.state.blocks.get(number as usize)
    }

    /// Base fee the next block will charge, none before London
    pub fn pending_base_fee(&self) -> Option<U256> {
        if !self.config.hardfork.supports_eip1559() {
            return None;
        }
        let head = self.head();
        Some(next_base_fee(head.base_fee(), head.gas_used, head.gas_limit))
    }

    pub fn balance(&self, address: &Address) -> U256 {
        self.state.world.balance(address)
    }

    pub fn nonce(&self, address: &Address) -> u64 {
        self.state.world.nonce(address)
    }

    /// Name of the contract deployed at `address`
    pub fn contract_at(&self, address: &Address) -> Option<&'static str> {
        self.state.world.contract_name(address)
    }

    pub fn transaction(&self, hash: &Hash) -> Option<&Transaction> {
        self.state.transactions.get(hash)
    }

    pub fn receipt(&self, hash: &Hash) -> Option<&Receipt> {
        self.state.receipts.get(hash)
    }

    // Fee fields of a transaction: explicit values are kept as given, missing ones filled
    fn fill_fees(
        &self,
        request: &TransactionRequest,
    ) -> Result<(TxType, Option<U256>, Option<U256>, Option<U256>), BlockchainError> {
        let base_fee = self.pending_base_fee();
        let kind = match request.fee_kind()? {
            FeeKind::Unspecified if base_fee.is_some() => FeeKind::Eip1559,
            FeeKind::Unspecified => FeeKind::Legacy,
            kind => kind,
        };

        match kind {
            FeeKind::Eip1559 => {
                let Some(base_fee) = base_fee else {
                    return Err(BlockchainError::UnsupportedTxType {
                        tx_type: TxType::Eip1559,
                        hardfork: self.config.hardfork,
                    });
                };

                let max_fee = request.max_fee_per_gas;
                let priority = match request.max_priority_fee_per_gas {
                    Some(priority) => priority,
                    None => {
                        let default = U256::from(DEFAULT_PRIORITY_FEE);
                        max_fee.map_or(default, |max| default.min(max))
                    }
                };
                let max_fee = max_fee.unwrap_or_else(|| {
                    base_fee
                        .saturating_mul(U256::from(2u64))
                        .saturating_add(priority)
                });
                if priority > max_fee {
                    return Err(TransactionError::PriorityFeeAboveMaxFee {
                        priority,
                        max: max_fee,
                    }
                    .into());
                }

                Ok((TxType::Eip1559, None, Some(priority), Some(max_fee)))
            }
            _ => {
                let gas_price = request.gas_price.unwrap_or_else(|| {
                    base_fee.unwrap_or_default() + U256::from(DEFAULT_PRIORITY_FEE)
                });
                Ok((TxType::Legacy, Some(gas_price), None, None))
            }
        }
    }

    // Transaction used for calls and estimation, never mined
    fn message(&self, request: &TransactionRequest, gas_limit: u64) -> Transaction {
        let from = request.from.unwrap_or_else(Address::zero);
        Transaction {
            hash: Hash::zero(),
            tx_type: TxType::Legacy,
            chain_id: self.config.chain_id,
            nonce: request.nonce.unwrap_or_else(|| self.nonce(&from)),
            from,
            to: request.to,
            value: request.value,
            data: request.data.clone(),
            gas_limit,
            gas_price: Some(U256::zero()),
            max_priority_fee_per_gas: None,
            max_fee_per_gas: None,
            block_number: None,
            block_hash: None,
            transaction_index: None,
        }
    }

    /// Gas the request would use if mined now
    pub fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64, BlockchainError> {
        let block_gas_limit = self.config.block_gas_limit;
        let message = self.message(request, block_gas_limit);
        let (_, gas_used) = simulate(&self.state.world, &self.artifacts, &message)
            .map_err(|e| BlockchainError::from_execution(e, block_gas_limit, None))?;
        Ok(gas_used)
    }

    /// Execute the request against the latest state and return its output, committing nothing
    pub fn call(&self, request: &TransactionRequest) -> Result<Vec<u8>, BlockchainError> {
        let gas_limit = request.gas_limit.unwrap_or(self.config.block_gas_limit);
        let message = self.message(request, gas_limit);
        let (output, _) = simulate(&self.state.world, &self.artifacts, &message)
            .map_err(|e| BlockchainError::from_execution(e, gas_limit, None))?;
        Ok(output)
    }

    /// Validate a request and complete its missing fields
    pub fn prepare_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<Transaction, BlockchainError> {
        let from = request.from.ok_or(TransactionError::MissingSender)?;
        if !self.accounts.contains(&from) {
            return Err(BlockchainError::UnknownAccount(from));
        }

        if let Some(chain_id) = request.chain_id {
            if chain_id != self.config.chain_id {
                return Err(TransactionError::ChainIdMismatch {
                    expected: self.config.chain_id,
                    got: chain_id,
                }
                .into());
            }
        }

        let expected_nonce = self.nonce(&from);
        let nonce = request.nonce.unwrap_or(expected_nonce);
        if nonce != expected_nonce {
            return Err(BlockchainError::NonceMismatch {
                expected: expected_nonce,
                got: nonce,
            });
        }

        let (tx_type, gas_price, max_priority_fee_per_gas, max_fee_per_gas) =
            self.fill_fees(request)?;

        let block_gas_limit = self.config.block_gas_limit;
        let gas_limit = match request.gas_limit {
            Some(gas_limit) => {
                let intrinsic = intrinsic_gas(&request.data, request.is_create());
                if gas_limit < intrinsic {
                    return Err(BlockchainError::IntrinsicGasTooLow {
                        gas_limit,
                        intrinsic,
                    });
                }
                if gas_limit > block_gas_limit {
                    return Err(BlockchainError::GasLimitExceedsBlock {
                        gas_limit,
                        block_gas_limit,
                    });
                }
                gas_limit
            }
            None => self.estimate_gas(request)?,
        };

        let mut tx = Transaction {
            hash: Hash::zero(),
            tx_type,
            chain_id: self.config.chain_id,
            nonce,
            from,
            to: request.to,
            value: request.value,
            data: request.data.clone(),
            gas_limit,
            gas_price,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            block_number: None,
            block_hash: None,
            transaction_index: None,
        };

        if let Some(base_fee) = self.pending_base_fee() {
            let fee_cap = tx.fee_cap();
            if fee_cap < base_fee {
                return Err(BlockchainError::FeeCapTooLow { fee_cap, base_fee });
            }
        }

        // Saturates on absurd fee fields, which no balance can cover
        let need = U256::from(gas_limit)
            .saturating_mul(tx.fee_cap())
            .saturating_add(tx.value);
        let have = self.balance(&from);
        if have < need {
            return Err(BlockchainError::InsufficientFunds {
                address: from,
                need,
                have,
            });
        }

        tx.hash = tx.compute_hash();
        Ok(tx)
    }

    fn next_timestamp(&mut self) -> u64 {
        let offset = std::mem::take(&mut self.state.time_offset);
        self.head().timestamp + 1 + offset
    }

    // Mine a block holding only `tx`
    fn mine_transaction(&mut self, mut tx: Transaction) -> (Transaction, Option<ExecutionError>) {
        let base_fee = self.pending_base_fee();
        let timestamp = self.next_timestamp();
        let (number, parent_hash) = {
            let head = self.head();
            (head.number + 1, head.hash)
        };

        let env = BlockEnv {
            base_fee: base_fee.unwrap_or_default(),
            coinbase: DEFAULT_COINBASE,
        };
        let outcome = apply_transaction(&mut self.state.world, &self.artifacts, &env, &tx);

        let block = Block::new(
            number,
            parent_hash,
            timestamp,
            self.config.block_gas_limit,
            outcome.gas_used,
            base_fee,
            env.coinbase,
            vec![tx.hash],
        );

        tx.block_number = Some(number);
        tx.block_hash = Some(block.hash);
        tx.transaction_index = Some(0);

        let mut logs = outcome.logs;
        for (index, log) in logs.iter_mut().enumerate() {
            log.block_number = number;
            log.transaction_hash = tx.hash;
            log.transaction_index = 0;
            log.log_index = index as u64;
        }

        let receipt = Receipt {
            transaction_hash: tx.hash,
            transaction_index: 0,
            block_hash: block.hash,
            block_number: number,
            from: tx.from,
            to: tx.to,
            contract_address: outcome.contract_address,
            tx_type: tx.tx_type,
            status: outcome.status,
            gas_used: outcome.gas_used,
            cumulative_gas_used: outcome.gas_used,
            effective_gas_price: outcome.effective_gas_price,
            logs,
        };

        if let Some(address) = &receipt.contract_address {
            info!(
                "Deployed {} at {} in block {}",
                self.contract_at(address).unwrap_or("contract"),
                address,
                number
            );
        }
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Mined block {} with {} transaction {}: status {:?}, gas used {}/{}, price {} gwei",
                number,
                tx.tx_type,
                tx.hash,
                receipt.status,
                receipt.gas_used,
                tx.gas_limit,
                format_gwei(receipt.effective_gas_price)
            );
        }

        self.state.transactions.insert(tx.hash, tx.clone());
        self.state.receipts.insert(tx.hash, receipt);
        self.state.blocks.push(block);

        (tx, outcome.error)
    }

    /// Validate, mine and return the request as accepted.
    ///
    /// A transaction that fails during execution is still mined, with its
    /// nonce consumed and its fee charged, and the failure is returned.
    pub fn send_transaction(
        &mut self,
        request: TransactionRequest,
    ) -> Result<Transaction, BlockchainError> {
        let tx = self.prepare_transaction(&request)?;
        let (tx, error) = self.mine_transaction(tx);
        match error {
            Some(error) => {
                warn!("Transaction {} failed in block {}: {}", tx.hash, self.block_number(), error);
                Err(BlockchainError::from_execution(
                    error,
                    tx.gas_limit,
                    Some(tx.hash),
                ))
            }
            None => Ok(tx),
        }
    }

    /// Mine a block without transactions
    pub fn mine_block(&mut self) -> &Block {
        let base_fee = self.pending_base_fee();
        let timestamp = self.next_timestamp();
        let head = self.head();
        let block = Block::new(
            head.number + 1,
            head.hash,
            timestamp,
            self.config.block_gas_limit,
            0,
            base_fee,
            DEFAULT_COINBASE,
            Vec::new(),
        );
        self.state.blocks.push(block);
        self.head()
    }

    /// Push the timestamp of the next block forward, returning the pending offset
    pub fn increase_time(&mut self, seconds: u64) -> u64 {
        self.state.time_offset += seconds;
        self.state.time_offset
    }

    pub fn snapshot(&mut self) -> SnapshotId {
        let id = self.next_snapshot_id;
        self.next_snapshot_id += 1;
        self.snapshots.push((id, self.state.clone()));
        debug!("Snapshot {} taken at block {}", id, self.block_number());
        id
    }

    /// Restore the state captured by `id`.
    ///
    /// The snapshot and every later one are consumed. Returns false for an
    /// unknown or already consumed id.
    pub fn revert(&mut self, id: SnapshotId) -> bool {
        let Some(position) = self.snapshots.iter().position(|(sid, _)| *sid == id) else {
            warn!("Cannot revert to unknown snapshot {}", id);
            return false;
        };

        if let Some((_, state)) = self.snapshots.drain(position..).next() {
            self.state = state;
        }
        debug!("Reverted to snapshot {} at block {}", id, self.block_number());
        true
    }
}

#[cfg(test)]
mod tests;
