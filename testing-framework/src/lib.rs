//! # tokenbench Testing Framework
//!
//! Fixture-based harness for testing contracts on the tokenbench devnet.
//!
//! ## Architecture Overview
//!
//! - **network**: TestNetwork over an in-process devnet, with snapshot-backed fixtures
//! - **signer**: unlocked accounts that submit transactions
//! - **contract**: factories, contract handles and the typed Token wrapper
//! - **utilities**: revert, event and balance-change assertions
//! - **invariants**: checkers run after tests (supply and balance conservation, nonces)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tokenbench_testing_framework::prelude::*;
//!
//! async fn deploy_token_fixture(network: TestNetwork) -> Result<(Token, Vec<Signer>)> {
//!     let token = Token::deploy(&network.contract_factory(Token::ARTIFACT).await?).await?;
//!     Ok((token, network.signers().await?))
//! }
//!
//! #[tokio::test]
//! async fn test_owner_holds_supply() {
//!     let network = TestNetworkBuilder::new().build().await.unwrap();
//!     let (token, signers) = network.load_fixture(deploy_token_fixture).await.unwrap();
//!
//!     let owner = signers[0].address();
//!     assert_eq!(token.balance_of(&owner).await.unwrap(), token.total_supply().await.unwrap());
//! }
//! ```
//!
//! ## Design Principles
//!
//! 1. **Isolated**: every test starts from a fixture snapshot
//! 2. **Typed failures**: reverts stay BlockchainError values inside anyhow
//! 3. **Automine**: a sent transaction is mined before the call returns

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Contract factories and handles
pub mod contract;

// Core invariant checkers (supply conservation, nonce monotonicity, etc.)
pub mod invariants;

/// Devnet handle, builder and fixtures
pub mod network;

/// Unlocked accounts
pub mod signer;

/// Shared assertion helpers
pub mod utilities;

// Convenient re-exports for common usage
pub mod prelude;

// Re-export commonly used types at crate root
pub use contract::{Contract, ContractFactory, ContractTransaction, Overrides, Token};
pub use network::{TestNetwork, TestNetworkBuilder};
pub use signer::Signer;

/// Framework version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
