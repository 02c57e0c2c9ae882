// File: testing-framework/src/utilities/assertions.rs
//
// Transaction Assertions
//
// Helpers turning the outcome of a contract call into a test verdict. Errors
// coming from the chain keep their BlockchainError inside the anyhow::Error,
// so revert reasons are read from the typed error rather than from strings.

use anyhow::{anyhow, bail, Context, Result};
use std::fmt::Debug;
use std::future::Future;
use tokenbench_common::{abi::Value, crypto::Address, U256};
use tokenbench_devnet::core::error::BlockchainError;

use crate::contract::{Contract, ContractTransaction, Token};

/// Expect `result` to be a revert and return it
///
/// # Errors
///
/// Fails when the call succeeded, or failed for a reason other than a revert
/// (for example a rejected nonce).
pub fn expect_revert<T: Debug>(result: Result<T>) -> Result<BlockchainError> {
    let error = match result {
        Ok(value) => bail!("Expected transaction to be reverted, got {:?}", value),
        Err(error) => error,
    };

    match error.downcast_ref::<BlockchainError>() {
        Some(chain_error) if chain_error.is_revert() => Ok(chain_error.clone()),
        _ => Err(anyhow!("Expected a revert, got: {:#}", error)),
    }
}

/// Expect `result` to be a revert with the given reason string
///
/// # Example
///
/// ```rust,ignore
/// expect_revert_with(token.connect(&addr1).transfer(&owner, 1u64).await, "Not enough tokens")?;
/// ```
pub fn expect_revert_with<T: Debug>(result: Result<T>, reason: &str) -> Result<BlockchainError> {
    let error = expect_revert(result)?;
    match error.revert_reason() {
        Some(actual) if actual == reason => Ok(error),
        Some(actual) => bail!(
            "Expected transaction to be reverted with reason '{}', but it reverted with reason '{}'",
            reason,
            actual
        ),
        None => bail!(
            "Expected transaction to be reverted with reason '{}', but it reverted without a reason",
            reason
        ),
    }
}

/// Number of `event` logs emitted by `contract` in `tx`
pub fn count_events(tx: &ContractTransaction, contract: &Contract, event: &str) -> Result<usize> {
    Ok(tx.events(contract, event)?.len())
}

/// Expect `tx` to emit `event` from `contract` with exactly `args`
pub fn expect_emit(
    tx: &ContractTransaction,
    contract: &Contract,
    event: &str,
    args: &[Value],
) -> Result<()> {
    let emitted = tx.events(contract, event)?;
    if emitted.iter().any(|values| values.as_slice() == args) {
        return Ok(());
    }

    let expected = render(args);
    if emitted.is_empty() {
        bail!(
            "Expected event {}({}) to be emitted, but it wasn't",
            event,
            expected
        );
    }
    let found: Vec<String> = emitted.iter().map(|values| render(values)).collect();
    bail!(
        "Expected event {}({}), but only found {}",
        event,
        expected,
        found.join(", ")
    )
}

fn render(values: &[Value]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run `action` and expect the token balance of each account to change by the matching delta
///
/// # Arguments
///
/// * `token` - Token to read balances from
/// * `accounts` - Accounts to watch
/// * `deltas` - Expected signed change, one per account
/// * `action` - State-changing step, usually a transfer
///
/// # Returns
///
/// The output of `action`, so the transaction can be inspected further.
pub async fn expect_token_balance_changes<Fut, T>(
    token: &Token,
    accounts: &[Address],
    deltas: &[i128],
    action: Fut,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    if accounts.len() != deltas.len() {
        bail!(
            "Got {} accounts but {} balance deltas",
            accounts.len(),
            deltas.len()
        );
    }

    let mut before = Vec::with_capacity(accounts.len());
    for account in accounts {
        before.push(token.balance_of(account).await?);
    }

    let output = action.await?;

    for ((account, start), delta) in accounts.iter().zip(before).zip(deltas) {
        let end = token.balance_of(account).await?;
        let change = U256::from(delta.unsigned_abs());
        let expected = if *delta >= 0 {
            start.checked_add(change)
        } else {
            start.checked_sub(change)
        }
        .with_context(|| format!("Balance delta {} of {} is out of range", delta, account))?;

        if end != expected {
            bail!(
                "Expected balance of {} to change by {}, but it went from {} to {}",
                account,
                delta,
                start,
                end
            );
        }
    }

    Ok(output)
}
