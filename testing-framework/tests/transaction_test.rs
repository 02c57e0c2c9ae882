// File: testing-framework/tests/transaction_test.rs
//
// Transaction Assembly Tests
//
// - Fee field validation before anything is mined
// - Legacy and EIP-1559 field echoes
// - Berlin hardfork (no base fee, legacy only)
// - Native coin and nonce invariants around fees

use tokenbench_common::transaction::TransactionError;
use tokenbench_devnet::config::DEFAULT_COINBASE;
use tokenbench_testing_framework::prelude::*;

async fn network(hardfork: Hardfork) -> TestNetwork {
    TestNetworkBuilder::new()
        .with_account_count(3)
        .with_hardfork(hardfork)
        .build()
        .await
        .unwrap()
}

fn chain_error(error: anyhow::Error) -> BlockchainError {
    error
        .downcast::<BlockchainError>()
        .expect("error comes from the chain")
}

#[tokio::test]
async fn test_fee_validation_rejects_before_mining() {
    let network = network(Hardfork::London).await;
    let owner = network.signer(0).await.unwrap();
    let addr1 = network.signer(1).await.unwrap();

    let mixed = owner
        .send_transaction(
            TransactionRequest::new()
                .to(addr1.address())
                .gas_price(GWEI_PRICE)
                .max_fee_per_gas(GWEI_PRICE),
        )
        .await
        .unwrap_err();
    assert_eq!(
        chain_error(mixed),
        BlockchainError::Transaction(TransactionError::MixedFeeModels)
    );

    let priority_above_max = owner
        .send_transaction(
            TransactionRequest::new()
                .to(addr1.address())
                .max_priority_fee_per_gas(2 * GWEI_PRICE)
                .max_fee_per_gas(GWEI_PRICE),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        chain_error(priority_above_max),
        BlockchainError::Transaction(TransactionError::PriorityFeeAboveMaxFee { .. })
    ));

    let wrong_nonce = owner
        .send_transaction(TransactionRequest::new().to(addr1.address()).nonce(5))
        .await
        .unwrap_err();
    assert_eq!(
        chain_error(wrong_nonce),
        BlockchainError::NonceMismatch {
            expected: 0,
            got: 5
        }
    );

    assert_eq!(network.provider().block_number().await.unwrap(), 0);
    assert_eq!(owner.nonce().await.unwrap(), 0);
}

const GWEI_PRICE: u64 = 1_000_000_000;

#[tokio::test]
async fn test_unaffordable_fee_fields_rejected() {
    let network = network(Hardfork::London).await;
    let owner = network.signer(0).await.unwrap();
    let addr1 = network.signer(1).await.unwrap();

    let max_fee = owner
        .send_transaction(
            TransactionRequest::new()
                .to(addr1.address())
                .gas_limit(21_000)
                .max_priority_fee_per_gas(1u64)
                .max_fee_per_gas(U256::max_value()),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        chain_error(max_fee),
        BlockchainError::InsufficientFunds { .. }
    ));

    let tip_only = owner
        .send_transaction(
            TransactionRequest::new()
                .to(addr1.address())
                .max_priority_fee_per_gas(U256::max_value()),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        chain_error(tip_only),
        BlockchainError::InsufficientFunds { .. }
    ));

    assert_eq!(network.provider().block_number().await.unwrap(), 0);
    assert_eq!(owner.nonce().await.unwrap(), 0);
}

#[tokio::test]
async fn test_legacy_gas_price_echoed() {
    let network = network(Hardfork::London).await;
    let owner = network.signer(0).await.unwrap();
    let addr1 = network.signer(1).await.unwrap();

    let tx = owner
        .send_transaction(
            TransactionRequest::new()
                .to(addr1.address())
                .gas_limit(21_000)
                .gas_price(3 * GWEI_PRICE),
        )
        .await
        .unwrap();
    assert_eq!(tx.tx_type, TxType::Legacy);
    assert_eq!(tx.gas_price, Some(U256::from(3 * GWEI_PRICE)));
    assert_eq!(tx.max_fee_per_gas, None);
    assert_eq!(tx.gas_limit, 21_000);
}

#[tokio::test]
async fn test_default_fees_follow_base_fee() {
    let network = network(Hardfork::London).await;
    let owner = network.signer(0).await.unwrap();
    let addr1 = network.signer(1).await.unwrap();
    let base_fee = network.devnet().pending_base_fee().await.unwrap();

    let tx = owner
        .send_transaction(TransactionRequest::new().to(addr1.address()))
        .await
        .unwrap();
    assert_eq!(tx.tx_type, TxType::Eip1559);
    assert_eq!(tx.gas_limit, 21_000);
    assert_eq!(tx.max_priority_fee_per_gas, Some(U256::from(GWEI_PRICE)));
    assert_eq!(
        tx.max_fee_per_gas,
        Some(base_fee * 2 + U256::from(GWEI_PRICE))
    );
}

#[tokio::test]
async fn test_berlin_is_legacy_only() {
    let network = network(Hardfork::Berlin).await;
    let owner = network.signer(0).await.unwrap();
    let addr1 = network.signer(1).await.unwrap();
    assert_eq!(network.devnet().pending_base_fee().await, None);

    let tx = owner
        .send_transaction(
            TransactionRequest::new()
                .to(addr1.address())
                .gas_limit(1_000_888),
        )
        .await
        .unwrap();
    assert_eq!(tx.tx_type, TxType::Legacy);
    assert_eq!(tx.gas_limit, 1_000_888);
    assert_eq!(tx.gas_price, Some(U256::from(GWEI_PRICE)));

    let block = network.provider().block(1).await.unwrap().unwrap();
    assert_eq!(block.base_fee_per_gas, None);

    let eip1559 = owner
        .send_transaction(
            TransactionRequest::new()
                .to(addr1.address())
                .max_priority_fee_per_gas(GWEI_PRICE)
                .max_fee_per_gas(GWEI_PRICE),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        chain_error(eip1559),
        BlockchainError::UnsupportedTxType { .. }
    ));
}

#[tokio::test]
async fn test_fees_burned_and_tipped() {
    let network = network(Hardfork::London).await;
    let signers = network.signers().await.unwrap();

    async fn total(network: &TestNetwork, signers: &[Signer]) -> U256 {
        let mut sum = network.provider().balance(&DEFAULT_COINBASE).await.unwrap();
        for signer in signers {
            sum += signer.balance().await.unwrap();
        }
        sum
    }

    let before = total(&network, &signers).await;
    let tx = signers[0]
        .send_transaction(
            TransactionRequest::new()
                .to(signers[1].address())
                .value(U256::from(12_345u64))
                .max_priority_fee_per_gas(770_151_733_000u64)
                .max_fee_per_gas(1_000_000_000_000u64),
        )
        .await
        .unwrap();

    let receipt = network
        .provider()
        .transaction_receipt(&tx.hash)
        .await
        .unwrap()
        .unwrap();
    let block = network
        .provider()
        .block(receipt.block_number)
        .await
        .unwrap()
        .unwrap();
    let burned = block.base_fee() * U256::from(receipt.gas_used);

    let after = total(&network, &signers).await;
    check_balance_conservation(before, after, burned).unwrap();

    let tip = receipt.fee_paid() - burned;
    assert_eq!(
        network.provider().balance(&DEFAULT_COINBASE).await.unwrap(),
        tip
    );
    check_nonce_monotonicity(signers[0].nonce().await.unwrap(), 1).unwrap();
}

#[tokio::test]
async fn test_reverts_consume_nonces() {
    let network = network(Hardfork::London).await;
    let token = Token::deploy(&network.contract_factory(Token::ARTIFACT).await.unwrap())
        .await
        .unwrap();
    let owner = network.signer(0).await.unwrap();
    let addr1 = network.signer(1).await.unwrap();
    let from_addr1 = token.connect(&addr1);

    for _ in 0..3 {
        let result = from_addr1
            .transfer_with(&owner.address(), 1u64, Overrides::new().gas_limit(60_000))
            .await;
        expect_revert_with(result, "Not enough tokens").unwrap();
    }

    check_nonce_monotonicity(addr1.nonce().await.unwrap(), 3).unwrap();
    // Deployment plus three mined reverts
    assert_eq!(network.provider().block_number().await.unwrap(), 4);
}
