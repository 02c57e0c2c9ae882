// tokenbench devnet
// In-process automining chain used by the test harness and the devnet binary

#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub mod config;
pub mod contracts;
pub mod core;
pub mod node;
pub mod provider;

pub use node::{Devnet, DevnetBuilder};
pub use provider::Provider;
