#![allow(clippy::module_inception)]
#![allow(clippy::too_many_arguments)]

pub mod abi;
pub mod config;
pub mod crypto;
pub mod error;
pub mod transaction;
pub mod utils;

// Re-exported so downstream crates agree on a single U256 type
pub use primitive_types::U256;
