//! Convenient re-exports for contract tests
//!
//! ```rust,ignore
//! use tokenbench_testing_framework::prelude::*;
//! ```

pub use crate::contract::{
    Contract, ContractFactory, ContractTransaction, Interface, Overrides, Token,
};
pub use crate::invariants::{
    check_balance_conservation, check_nonce_monotonicity, check_token_supply_conservation,
};
pub use crate::network::{TestNetwork, TestNetworkBuilder};
pub use crate::signer::Signer;
pub use crate::utilities::{
    count_events, expect_emit, expect_revert, expect_revert_with, expect_token_balance_changes,
};

pub use anyhow::Result;
pub use tokenbench_common::{
    abi::Value,
    crypto::{Address, Hash},
    transaction::{Receipt, ReceiptStatus, Transaction, TransactionRequest, TxType},
    U256,
};
pub use tokenbench_devnet::{
    config::{DevnetConfig, Hardfork},
    core::error::BlockchainError,
    Provider,
};
