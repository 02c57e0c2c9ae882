//! Core invariant checkers
//!
//! Implements chain invariants checked after contract tests:
//! - Token supply conservation (balances sum to totalSupply)
//! - Native balance conservation (only burned fees leave circulation)
//! - Nonce monotonicity (confirmed tx count)

use anyhow::{bail, Context, Result};
use tokenbench_common::{crypto::Address, U256};

use crate::contract::Token;

/// Check that the token balances of `holders` add up to the total supply.
///
/// `holders` must cover every account that ever held tokens, usually all signers.
pub async fn check_token_supply_conservation(token: &Token, holders: &[Address]) -> Result<()> {
    let total_supply = token.total_supply().await?;

    let mut sum = U256::zero();
    for holder in holders {
        let balance = token.balance_of(holder).await?;
        sum = sum
            .checked_add(balance)
            .context("Token balances overflow")?;
    }

    if sum != total_supply {
        bail!(
            "Token supply not conserved: balances sum to {}, totalSupply is {}",
            sum,
            total_supply
        );
    }
    Ok(())
}

/// Check balance conservation
///
/// Native coin only leaves circulation through the burned base fee, so
/// `total_after + burned` must equal `total_before` when the totals include
/// the coinbase.
pub fn check_balance_conservation(total_before: U256, total_after: U256, burned: U256) -> Result<()> {
    let accounted = total_after
        .checked_add(burned)
        .context("Balance total overflow")?;
    if accounted != total_before {
        bail!(
            "Balance not conserved: before {}, after {} with {} burned",
            total_before,
            total_after,
            burned
        );
    }
    Ok(())
}

/// Check nonce monotonicity
///
/// The nonce of an account equals the number of its confirmed transactions,
/// reverted ones included.
pub fn check_nonce_monotonicity(nonce: u64, confirmed_count: u64) -> Result<()> {
    if nonce != confirmed_count {
        bail!(
            "Nonce {} does not match {} confirmed transactions",
            nonce,
            confirmed_count
        );
    }
    Ok(())
}
