use primitive_types::U256;
use tokenbench_common::{
    abi::{Abi, Value},
    config::{DEFAULT_ACCOUNT_BALANCE, DEFAULT_PRIORITY_FEE, GWEI},
    crypto::Address,
    transaction::{ReceiptStatus, TransactionError, TransactionRequest, TxType},
};

use super::{dev_account, Blockchain};
use crate::{
    config::{DevnetConfig, Hardfork},
    contracts::ArtifactRegistry,
    core::error::BlockchainError,
};

fn create_test_chain(hardfork: Hardfork) -> Blockchain {
    let config = DevnetConfig {
        account_count: 4,
        hardfork,
        ..Default::default()
    };
    Blockchain::new(config, ArtifactRegistry::builtin().unwrap())
}

fn deploy_token(chain: &mut Blockchain) -> Address {
    let data = chain.artifact("Token").unwrap().deployment_data(&[]).unwrap();
    let owner = chain.accounts()[0];
    let tx = chain
        .send_transaction(TransactionRequest::new().from(owner).data(data))
        .unwrap();
    chain
        .receipt(&tx.hash)
        .unwrap()
        .contract_address
        .unwrap()
}

fn transfer_data(to: Address, amount: u64) -> Vec<u8> {
    Abi::parse(&["function transfer(address to, uint256 amount)"])
        .unwrap()
        .encode_function_data("transfer", &[Value::Address(to), Value::from(amount)])
        .unwrap()
}

#[test]
fn test_genesis() {
    let chain = create_test_chain(Hardfork::London);
    assert_eq!(chain.block_number(), 0);
    assert_eq!(chain.accounts().len(), 4);
    assert_eq!(chain.accounts()[1], dev_account(1));
    for account in chain.accounts() {
        assert_eq!(chain.balance(account), U256::from(DEFAULT_ACCOUNT_BALANCE));
        assert_eq!(chain.nonce(account), 0);
    }
    assert_eq!(chain.head().base_fee_per_gas, Some(U256::from(GWEI)));
}

#[test]
fn test_value_transfer_mines_a_block() {
    let mut chain = create_test_chain(Hardfork::London);
    let (alice, bob) = (chain.accounts()[0], chain.accounts()[1]);

    let tx = chain
        .send_transaction(
            TransactionRequest::new()
                .from(alice)
                .to(bob)
                .value(U256::from(1_000u64)),
        )
        .unwrap();

    assert_eq!(chain.block_number(), 1);
    assert_eq!(tx.block_number, Some(1));
    assert_eq!(tx.gas_limit, 21_000);
    assert_eq!(tx.tx_type, TxType::Eip1559);
    assert_eq!(chain.nonce(&alice), 1);
    assert_eq!(
        chain.balance(&bob),
        U256::from(DEFAULT_ACCOUNT_BALANCE) + U256::from(1_000u64)
    );

    let receipt = chain.receipt(&tx.hash).unwrap();
    assert_eq!(receipt.status, ReceiptStatus::Success);
    assert_eq!(receipt.block_hash, chain.head().hash);
    assert_eq!(
        chain.balance(&alice),
        U256::from(DEFAULT_ACCOUNT_BALANCE) - U256::from(1_000u64) - receipt.fee_paid()
    );
}

#[test]
fn test_explicit_fee_fields_are_kept() {
    let mut chain = create_test_chain(Hardfork::London);
    let token = deploy_token(&mut chain);
    let (owner, receiver) = (chain.accounts()[0], chain.accounts()[1]);

    let tx = chain
        .send_transaction(
            TransactionRequest::new()
                .from(owner)
                .to(token)
                .data(transfer_data(receiver, 50))
                .gas_limit(1_000_866)
                .max_priority_fee_per_gas(770_151_733_000u64)
                .max_fee_per_gas(1_000_000_000_000u64),
        )
        .unwrap();

    let stored = chain.transaction(&tx.hash).unwrap();
    assert_eq!(stored.tx_type, TxType::Eip1559);
    assert_eq!(stored.gas_limit, 1_000_866);
    assert_eq!(
        stored.max_priority_fee_per_gas,
        Some(U256::from(770_151_733_000u64))
    );
    assert_eq!(stored.max_fee_per_gas, Some(U256::from(1_000_000_000_000u64)));
    assert_eq!(stored.gas_price, None);

    // base fee + tip stays under the cap
    let receipt = chain.receipt(&tx.hash).unwrap();
    let base_fee = chain.head().base_fee();
    assert_eq!(
        receipt.effective_gas_price,
        base_fee + U256::from(770_151_733_000u64)
    );
    assert!(receipt.gas_used < 1_000_866);
}

#[test]
fn test_explicit_legacy_gas_price_is_kept() {
    let mut chain = create_test_chain(Hardfork::London);
    let (alice, bob) = (chain.accounts()[0], chain.accounts()[1]);

    let tx = chain
        .send_transaction(
            TransactionRequest::new()
                .from(alice)
                .to(bob)
                .gas_limit(1_000_888)
                .gas_price(2 * GWEI),
        )
        .unwrap();

    assert_eq!(tx.tx_type, TxType::Legacy);
    assert_eq!(tx.gas_limit, 1_000_888);
    assert_eq!(tx.gas_price, Some(U256::from(2 * GWEI)));
    assert_eq!(
        chain.receipt(&tx.hash).unwrap().effective_gas_price,
        U256::from(2 * GWEI)
    );
}

#[test]
fn test_default_eip1559_fees() {
    let mut chain = create_test_chain(Hardfork::London);
    let (alice, bob) = (chain.accounts()[0], chain.accounts()[1]);
    let base_fee = chain.pending_base_fee().unwrap();

    let tx = chain
        .send_transaction(TransactionRequest::new().from(alice).to(bob))
        .unwrap();

    let priority = U256::from(DEFAULT_PRIORITY_FEE);
    assert_eq!(tx.max_priority_fee_per_gas, Some(priority));
    assert_eq!(tx.max_fee_per_gas, Some(base_fee * 2 + priority));
}

#[test]
fn test_reverted_transfer_with_gas_limit_is_mined() {
    let mut chain = create_test_chain(Hardfork::London);
    let token = deploy_token(&mut chain);
    let (owner, poor) = (chain.accounts()[0], chain.accounts()[1]);
    let block_before = chain.block_number();

    let error = chain
        .send_transaction(
            TransactionRequest::new()
                .from(poor)
                .to(token)
                .data(transfer_data(owner, 1))
                .gas_limit(1_000_888),
        )
        .unwrap_err();

    assert_eq!(error.revert_reason(), Some("Not enough tokens"));
    let hash = *error.tx_hash().unwrap();
    let receipt = chain.receipt(&hash).unwrap();
    assert_eq!(receipt.status, ReceiptStatus::Reverted);
    assert!(receipt.logs.is_empty());
    assert_eq!(chain.block_number(), block_before + 1);
    assert_eq!(chain.nonce(&poor), 1);
}

#[test]
fn test_reverted_estimation_mines_nothing() {
    let mut chain = create_test_chain(Hardfork::London);
    let token = deploy_token(&mut chain);
    let (owner, poor) = (chain.accounts()[0], chain.accounts()[1]);
    let block_before = chain.block_number();

    let error = chain
        .send_transaction(
            TransactionRequest::new()
                .from(poor)
                .to(token)
                .data(transfer_data(owner, 1)),
        )
        .unwrap_err();

    assert_eq!(error.revert_reason(), Some("Not enough tokens"));
    assert_eq!(error.tx_hash(), None);
    assert_eq!(chain.block_number(), block_before);
    assert_eq!(chain.nonce(&poor), 0);
}

#[test]
fn test_rejections() {
    let mut chain = create_test_chain(Hardfork::London);
    let (alice, bob) = (chain.accounts()[0], chain.accounts()[1]);
    let stranger = Address::new([7u8; 20]);

    let cases: Vec<(TransactionRequest, BlockchainError)> = vec![
        (
            TransactionRequest::new().to(bob),
            TransactionError::MissingSender.into(),
        ),
        (
            TransactionRequest::new().from(stranger).to(bob),
            BlockchainError::UnknownAccount(stranger),
        ),
        (
            TransactionRequest::new().from(alice).to(bob).nonce(3),
            BlockchainError::NonceMismatch {
                expected: 0,
                got: 3,
            },
        ),
        (
            TransactionRequest::new().from(alice).to(bob).chain_id(1),
            TransactionError::ChainIdMismatch {
                expected: 31337,
                got: 1,
            }
            .into(),
        ),
        (
            TransactionRequest::new()
                .from(alice)
                .to(bob)
                .gas_price(GWEI)
                .max_fee_per_gas(GWEI),
            TransactionError::MixedFeeModels.into(),
        ),
        (
            TransactionRequest::new().from(alice).to(bob).gas_limit(20_000),
            BlockchainError::IntrinsicGasTooLow {
                gas_limit: 20_000,
                intrinsic: 21_000,
            },
        ),
        (
            TransactionRequest::new()
                .from(alice)
                .to(bob)
                .gas_limit(30_000_001),
            BlockchainError::GasLimitExceedsBlock {
                gas_limit: 30_000_001,
                block_gas_limit: 30_000_000,
            },
        ),
        (
            TransactionRequest::new().from(alice).to(bob).gas_price(1u64),
            BlockchainError::FeeCapTooLow {
                fee_cap: U256::one(),
                base_fee: chain.pending_base_fee().unwrap(),
            },
        ),
    ];

    for (request, expected) in cases {
        assert_eq!(chain.send_transaction(request).unwrap_err(), expected);
    }
    assert_eq!(chain.block_number(), 0);
}

#[test]
fn test_insufficient_funds() {
    let mut chain = create_test_chain(Hardfork::London);
    let (alice, bob) = (chain.accounts()[0], chain.accounts()[1]);

    let error = chain
        .send_transaction(
            TransactionRequest::new()
                .from(alice)
                .to(bob)
                .value(U256::from(DEFAULT_ACCOUNT_BALANCE)),
        )
        .unwrap_err();
    assert!(matches!(error, BlockchainError::InsufficientFunds { .. }));
}

#[test]
fn test_huge_fee_fields_are_rejected() {
    let mut chain = create_test_chain(Hardfork::London);
    let (alice, bob) = (chain.accounts()[0], chain.accounts()[1]);

    let error = chain
        .send_transaction(
            TransactionRequest::new()
                .from(alice)
                .to(bob)
                .gas_limit(21_000)
                .max_priority_fee_per_gas(1u64)
                .max_fee_per_gas(U256::max_value()),
        )
        .unwrap_err();
    assert!(matches!(
        error,
        BlockchainError::InsufficientFunds { need, .. } if need == U256::max_value()
    ));

    // Default max fee derived from a huge tip
    let error = chain
        .send_transaction(
            TransactionRequest::new()
                .from(alice)
                .to(bob)
                .max_priority_fee_per_gas(U256::max_value()),
        )
        .unwrap_err();
    assert!(matches!(error, BlockchainError::InsufficientFunds { .. }));

    let error = chain
        .send_transaction(
            TransactionRequest::new()
                .from(alice)
                .to(bob)
                .gas_limit(21_000)
                .gas_price(U256::max_value())
                .value(U256::max_value()),
        )
        .unwrap_err();
    assert!(matches!(error, BlockchainError::InsufficientFunds { .. }));

    assert_eq!(chain.block_number(), 0);
    assert_eq!(chain.nonce(&alice), 0);
}

#[test]
fn test_berlin_rejects_eip1559() {
    let mut chain = create_test_chain(Hardfork::Berlin);
    let (alice, bob) = (chain.accounts()[0], chain.accounts()[1]);
    assert_eq!(chain.pending_base_fee(), None);

    let error = chain
        .send_transaction(
            TransactionRequest::new()
                .from(alice)
                .to(bob)
                .max_fee_per_gas(GWEI),
        )
        .unwrap_err();
    assert_eq!(
        error,
        BlockchainError::UnsupportedTxType {
            tx_type: TxType::Eip1559,
            hardfork: Hardfork::Berlin,
        }
    );

    let tx = chain
        .send_transaction(TransactionRequest::new().from(alice).to(bob))
        .unwrap();
    assert_eq!(tx.tx_type, TxType::Legacy);
    assert_eq!(tx.gas_price, Some(U256::from(DEFAULT_PRIORITY_FEE)));
    assert_eq!(chain.head().base_fee_per_gas, None);
}

#[test]
fn test_base_fee_follows_usage() {
    let mut chain = create_test_chain(Hardfork::London);
    let genesis_fee = chain.head().base_fee();

    // Empty genesis: next fee drops by an eighth
    let pending = chain.pending_base_fee().unwrap();
    assert_eq!(pending, genesis_fee - genesis_fee / 8);

    chain.mine_block();
    assert_eq!(chain.head().base_fee(), pending);
}

#[test]
fn test_call_commits_nothing() {
    let mut chain = create_test_chain(Hardfork::London);
    let token = deploy_token(&mut chain);
    let (owner, receiver) = (chain.accounts()[0], chain.accounts()[1]);
    let block_before = chain.block_number();

    let output = chain
        .call(
            &TransactionRequest::new()
                .from(owner)
                .to(token)
                .data(transfer_data(receiver, 50)),
        )
        .unwrap();
    assert!(output.is_empty());
    assert_eq!(chain.block_number(), block_before);
    assert_eq!(chain.nonce(&owner), 1);
}

#[test]
fn test_snapshot_and_revert() {
    let mut chain = create_test_chain(Hardfork::London);
    let (alice, bob) = (chain.accounts()[0], chain.accounts()[1]);

    let first = chain.snapshot();
    chain
        .send_transaction(TransactionRequest::new().from(alice).to(bob))
        .unwrap();
    let second = chain.snapshot();
    chain
        .send_transaction(TransactionRequest::new().from(alice).to(bob))
        .unwrap();
    assert_eq!(chain.block_number(), 2);

    assert!(chain.revert(first));
    assert_eq!(chain.block_number(), 0);
    assert_eq!(chain.nonce(&alice), 0);
    assert_eq!(chain.balance(&alice), U256::from(DEFAULT_ACCOUNT_BALANCE));

    // Reverting consumes the snapshot and every later one
    assert!(!chain.revert(first));
    assert!(!chain.revert(second));
    assert!(!chain.revert(42));

    // Ids keep increasing
    assert!(chain.snapshot() > second);
}

#[test]
fn test_increase_time() {
    let mut chain = create_test_chain(Hardfork::London);
    let genesis_time = chain.head().timestamp;

    assert_eq!(chain.increase_time(3600), 3600);
    chain.mine_block();
    assert_eq!(chain.head().timestamp, genesis_time + 1 + 3600);
    chain.mine_block();
    assert_eq!(chain.head().timestamp, genesis_time + 3600 + 2);
}
