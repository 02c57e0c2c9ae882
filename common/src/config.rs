pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Smallest unit of the native coin, 18 decimals
pub const WEI: u64 = 1;
pub const GWEI: u64 = 1_000_000_000 * WEI;
// Coin value as a 128-bit integer, it does not fit in u64 once multiplied
pub const ETHER: u128 = 1_000_000_000_000_000_000;

// ===== CHAIN DEFAULTS =====
// Values mirror the usual local development chain so tooling defaults behave the same

pub const DEFAULT_CHAIN_ID: u64 = 31337;
pub const DEFAULT_ACCOUNT_COUNT: usize = 20;
// 10_000 coins per dev account
pub const DEFAULT_ACCOUNT_BALANCE: u128 = 10_000 * ETHER;
pub const DEFAULT_BLOCK_GAS_LIMIT: u64 = 30_000_000;
pub const DEFAULT_INITIAL_BASE_FEE: u64 = GWEI;
// 2024-01-01 00:00:00 UTC
pub const DEFAULT_GENESIS_TIMESTAMP: u64 = 1_704_067_200;
// Tip added when a transaction leaves its fee fields empty
pub const DEFAULT_PRIORITY_FEE: u64 = GWEI;

// ===== EIP-1559 =====

pub const BASE_FEE_MAX_CHANGE_DENOMINATOR: u64 = 8;
pub const ELASTICITY_MULTIPLIER: u64 = 2;

// ===== GAS SCHEDULE =====

// Base cost of any transaction
pub const TX_BASE_GAS: u64 = 21_000;
// Extra cost of a contract creation
pub const TX_CREATE_GAS: u64 = 32_000;
pub const TX_DATA_ZERO_GAS: u64 = 4;
pub const TX_DATA_NON_ZERO_GAS: u64 = 16;

// Cold storage read
pub const STORAGE_READ_GAS: u64 = 2_100;
// Write to a slot that already holds a non-zero value
pub const STORAGE_UPDATE_GAS: u64 = 5_000;
// Write to a slot that was zero
pub const STORAGE_SET_GAS: u64 = 20_000;

pub const LOG_GAS: u64 = 375;
pub const LOG_TOPIC_GAS: u64 = 375;
pub const LOG_DATA_GAS: u64 = 8;

// Paid once per deployed contract, flat because native contracts have no bytecode size
pub const CODE_DEPOSIT_GAS: u64 = 200 * 512;

// ===== NATIVE CONTRACTS =====

// Prefix of deployment data for contracts implemented natively by the devnet.
// 0xfe is the invalid opcode, so such code can never be mistaken for EVM bytecode.
pub const NATIVE_CODE_MAGIC: [u8; 4] = [0xfe, b'n', b'a', b't'];
