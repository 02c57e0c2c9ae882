//! Configuration of the development chain.

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use strum::Display;
use tokenbench_common::{
    config::{
        DEFAULT_ACCOUNT_BALANCE, DEFAULT_ACCOUNT_COUNT, DEFAULT_BLOCK_GAS_LIMIT, DEFAULT_CHAIN_ID,
        DEFAULT_GENESIS_TIMESTAMP, DEFAULT_INITIAL_BASE_FEE,
    },
    crypto::Address,
};

// Fee recipient of every mined block
pub const DEFAULT_COINBASE: Address = Address::new([
    0xc0, 0x14, 0xba, 0x5e, 0xc0, 0x14, 0xba, 0x5e, 0xc0, 0x14, 0xba, 0x5e, 0xc0, 0x14, 0xba, 0x5e,
    0xc0, 0x14, 0xba, 0x5e,
]);

const fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

const fn default_account_count() -> usize {
    DEFAULT_ACCOUNT_COUNT
}

const fn default_account_balance() -> u128 {
    DEFAULT_ACCOUNT_BALANCE
}

const fn default_block_gas_limit() -> u64 {
    DEFAULT_BLOCK_GAS_LIMIT
}

const fn default_initial_base_fee() -> u64 {
    DEFAULT_INITIAL_BASE_FEE
}

const fn default_genesis_timestamp() -> u64 {
    DEFAULT_GENESIS_TIMESTAMP
}

/// Fee rules the chain enforces
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, clap::ValueEnum, Serialize, Deserialize,
)]
#[clap(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Hardfork {
    // Legacy gas price only, no base fee
    Berlin,
    // Base fee market, both transaction types accepted
    #[default]
    London,
}

impl Hardfork {
    pub fn supports_eip1559(&self) -> bool {
        matches!(self, Hardfork::London)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, clap::ValueEnum, Serialize, Deserialize,
)]
#[clap(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Development chain settings, usable from the command line or a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, clap::Parser, Serialize, Deserialize)]
#[command(name = "tokenbench_devnet")]
#[command(about = "Automining development chain with a native token contract", long_about = None)]
pub struct DevnetConfig {
    /// Chain id transactions must carry, if they carry one.
    #[clap(name = "chain-id", long, default_value_t = default_chain_id())]
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Number of unlocked accounts funded at genesis.
    #[clap(name = "accounts", long, default_value_t = default_account_count())]
    #[serde(default = "default_account_count")]
    pub account_count: usize,

    /// Genesis balance of each account, in wei.
    #[clap(name = "account-balance", long, default_value_t = default_account_balance())]
    #[serde(default = "default_account_balance")]
    pub account_balance: u128,

    /// Maximum gas of a block, and so of a single transaction.
    #[clap(name = "block-gas-limit", long, default_value_t = default_block_gas_limit())]
    #[serde(default = "default_block_gas_limit")]
    pub block_gas_limit: u64,

    /// Base fee of the genesis block, in wei.
    ///
    /// Ignored before London.
    #[clap(name = "initial-base-fee", long, default_value_t = default_initial_base_fee())]
    #[serde(default = "default_initial_base_fee")]
    pub initial_base_fee: u64,

    #[clap(name = "hardfork", long, value_enum, default_value_t = Hardfork::default())]
    #[serde(default)]
    pub hardfork: Hardfork,

    /// Unix timestamp of the genesis block.
    #[clap(name = "genesis-timestamp", long, default_value_t = default_genesis_timestamp())]
    #[serde(default = "default_genesis_timestamp")]
    pub genesis_timestamp: u64,

    #[clap(name = "log-level", long, value_enum, default_value_t = LogLevel::default())]
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for DevnetConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            account_count: DEFAULT_ACCOUNT_COUNT,
            account_balance: DEFAULT_ACCOUNT_BALANCE,
            block_gas_limit: DEFAULT_BLOCK_GAS_LIMIT,
            initial_base_fee: DEFAULT_INITIAL_BASE_FEE,
            hardfork: Hardfork::default(),
            genesis_timestamp: DEFAULT_GENESIS_TIMESTAMP,
            log_level: LogLevel::default(),
        }
    }
}
