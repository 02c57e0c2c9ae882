pub mod block;
pub mod blockchain;
pub mod error;
pub mod executor;
pub mod gas;
pub mod state;
