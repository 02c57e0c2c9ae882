use primitive_types::U256;

use crate::{
    config::GWEI,
    crypto::{Address, Hash},
    transaction::{FeeKind, Transaction, TransactionError, TransactionRequest, TxType},
};

fn create_test_address(id: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = id;
    Address::new(bytes)
}

fn create_test_transaction(tx_type: TxType) -> Transaction {
    let (gas_price, max_priority_fee_per_gas, max_fee_per_gas) = match tx_type {
        TxType::Legacy => (Some(U256::from(3 * GWEI)), None, None),
        TxType::Eip1559 => (None, Some(U256::from(2 * GWEI)), Some(U256::from(10 * GWEI))),
    };

    Transaction {
        hash: Hash::zero(),
        tx_type,
        chain_id: 31337,
        nonce: 7,
        from: create_test_address(1),
        to: Some(create_test_address(2)),
        value: U256::zero(),
        data: vec![0xa9, 0x05, 0x9c, 0xbb],
        gas_limit: 1_000_888,
        gas_price,
        max_priority_fee_per_gas,
        max_fee_per_gas,
        block_number: None,
        block_hash: None,
        transaction_index: None,
    }
}

#[test]
fn test_fee_kind_unspecified() {
    let request = TransactionRequest::new()
        .to(create_test_address(2))
        .gas_limit(1_000_888);
    assert_eq!(request.fee_kind(), Ok(FeeKind::Unspecified));
}

#[test]
fn test_fee_kind_legacy() {
    let request = TransactionRequest::new().gas_price(GWEI);
    assert_eq!(request.fee_kind(), Ok(FeeKind::Legacy));
}

#[test]
fn test_fee_kind_eip1559_with_one_field() {
    // The missing field is left for the chain to fill
    let request = TransactionRequest::new().max_fee_per_gas(GWEI);
    assert_eq!(request.fee_kind(), Ok(FeeKind::Eip1559));
}

#[test]
fn test_fee_kind_rejects_mixed_models() {
    let request = TransactionRequest::new()
        .gas_price(GWEI)
        .max_fee_per_gas(GWEI);
    assert_eq!(request.fee_kind(), Err(TransactionError::MixedFeeModels));
}

#[test]
fn test_fee_kind_rejects_priority_above_max() {
    let request = TransactionRequest::new()
        .max_priority_fee_per_gas(2 * GWEI)
        .max_fee_per_gas(GWEI);
    assert_eq!(
        request.fee_kind(),
        Err(TransactionError::PriorityFeeAboveMaxFee {
            priority: U256::from(2 * GWEI),
            max: U256::from(GWEI),
        })
    );
}

#[test]
fn test_request_serde_uses_camel_case() {
    let request = TransactionRequest::new()
        .to(create_test_address(2))
        .gas_limit(1_000_866)
        .max_priority_fee_per_gas(770_151_733_000u64)
        .max_fee_per_gas(1_000_000_000_000u64);

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["gasLimit"], 1_000_866);
    assert!(json.get("maxPriorityFeePerGas").is_some());
    assert!(json.get("gasPrice").is_none());

    let back: TransactionRequest = serde_json::from_value(json).unwrap();
    assert_eq!(back, request);
}

#[test]
fn test_effective_gas_price_eip1559_is_capped() {
    let tx = create_test_transaction(TxType::Eip1559);

    // base 1 gwei + tip 2 gwei, under the 10 gwei cap
    assert_eq!(
        tx.effective_gas_price(U256::from(GWEI)),
        U256::from(3 * GWEI)
    );
    // base 9 gwei + tip 2 gwei, capped at 10 gwei
    assert_eq!(
        tx.effective_gas_price(U256::from(9 * GWEI)),
        U256::from(10 * GWEI)
    );
    assert_eq!(tx.fee_cap(), U256::from(10 * GWEI));
}

#[test]
fn test_effective_gas_price_legacy_ignores_base_fee() {
    let tx = create_test_transaction(TxType::Legacy);
    assert_eq!(
        tx.effective_gas_price(U256::from(GWEI)),
        U256::from(3 * GWEI)
    );
}

#[test]
fn test_hash_ignores_block_placement() {
    let pending = create_test_transaction(TxType::Eip1559);
    let mut mined = pending.clone();
    mined.block_number = Some(4);
    mined.block_hash = Some(Hash::max());
    mined.transaction_index = Some(0);

    assert_eq!(pending.compute_hash(), mined.compute_hash());
}

#[test]
fn test_hash_covers_fee_fields() {
    let tx = create_test_transaction(TxType::Eip1559);
    let mut bumped = tx.clone();
    bumped.max_fee_per_gas = Some(U256::from(11 * GWEI));

    assert_ne!(tx.compute_hash(), bumped.compute_hash());
    assert_ne!(
        tx.compute_hash(),
        create_test_transaction(TxType::Legacy).compute_hash()
    );
}
