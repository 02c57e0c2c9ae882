// tokenbench devnet
//
// Boots an in-process devnet from command line flags, deploys the Token
// contract and replays the transfer scenario, logging every receipt.
//
// Usage:
//   cargo run --bin tokenbench_devnet -- --accounts 3 --log-level debug

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info};
use std::sync::Arc;

use tokenbench_common::{
    abi::Value,
    crypto::{Address, Hash},
    transaction::TransactionRequest,
    utils::{format_ether, format_gwei},
};
use tokenbench_devnet::{config::DevnetConfig, DevnetBuilder, Provider};

#[tokio::main]
async fn main() -> Result<()> {
    let config = DevnetConfig::parse();

    // RUST_LOG takes precedence over --log-level
    let mut logger = env_logger::Builder::new();
    logger
        .filter_level(config.log_level.into())
        .format_timestamp_millis()
        .parse_default_env()
        .init();

    info!("tokenbench devnet v{}", tokenbench_common::config::VERSION);
    if log::log_enabled!(log::Level::Debug) {
        log::debug!("Configuration: {}", serde_json::to_string(&config)?);
    }

    if config.account_count < 3 {
        return Err(anyhow!(
            "The transfer scenario needs at least 3 accounts, got {}",
            config.account_count
        ));
    }

    let devnet = DevnetBuilder::new()
        .with_config(config)
        .build_shared()
        .context("Failed to start devnet")?;
    let provider: Arc<dyn Provider> = devnet.clone();

    let accounts = provider.accounts().await?;
    let (owner, addr1, addr2) = (accounts[0], accounts[1], accounts[2]);
    info!("Owner {}, addr1 {}, addr2 {}", owner, addr1, addr2);

    let artifact = devnet.artifact("Token").await?;
    let deploy = provider
        .send_transaction(
            TransactionRequest::new()
                .from(owner)
                .data(artifact.deployment_data(&[])?),
        )
        .await
        .context("Token deployment failed")?;
    let token = provider
        .transaction_receipt(&deploy.hash)
        .await?
        .and_then(|receipt| receipt.contract_address)
        .context("Deployment receipt has no contract address")?;
    report(provider.as_ref(), "deploy", &deploy.hash).await?;

    let transfer = |to: Address, amount: u64| -> Result<Vec<u8>> {
        Ok(artifact
            .abi()
            .encode_function_data("transfer", &[Value::Address(to), Value::from(amount)])?)
    };

    let steps = vec![
        (
            "owner -> addr1",
            TransactionRequest::new()
                .from(owner)
                .to(token)
                .data(transfer(addr1, 50)?),
        ),
        (
            "addr1 -> addr2",
            TransactionRequest::new()
                .from(addr1)
                .to(token)
                .data(transfer(addr2, 50)?),
        ),
        (
            "addr1 -> owner, empty balance",
            TransactionRequest::new()
                .from(addr1)
                .to(token)
                .data(transfer(owner, 1)?),
        ),
        (
            "raw, gas limit only",
            TransactionRequest::new()
                .from(owner)
                .to(token)
                .data(transfer(owner, 1)?)
                .gas_limit(1_000_888),
        ),
        (
            "raw, eip1559 fields",
            TransactionRequest::new()
                .from(owner)
                .to(token)
                .data(transfer(owner, 1)?)
                .gas_limit(1_000_866)
                .max_priority_fee_per_gas(770_151_733_000u64)
                .max_fee_per_gas(1_000_000_000_000u64),
        ),
    ];

    for (label, request) in steps {
        match provider.send_transaction(request).await {
            Ok(tx) => report(provider.as_ref(), label, &tx.hash).await?,
            Err(e) => error!("{}: {}", label, e),
        }
    }

    for (name, account) in [("owner", owner), ("addr1", addr1), ("addr2", addr2)] {
        let data = artifact
            .abi()
            .encode_function_data("balanceOf", &[Value::Address(account)])?;
        let output = provider
            .call(&TransactionRequest::new().to(token).data(data))
            .await?;
        let balance = artifact
            .abi()
            .decode_function_result("balanceOf", &output)?
            .pop()
            .and_then(|value| value.as_uint())
            .unwrap_or_default();
        info!(
            "{} holds {} MHT and {} ETH",
            name,
            balance,
            format_ether(provider.balance(&account).await?)
        );
    }

    info!("Chain height {}", provider.block_number().await?);
    Ok(())
}

async fn report(provider: &dyn Provider, label: &str, hash: &Hash) -> Result<()> {
    let tx = provider
        .transaction(hash)
        .await?
        .with_context(|| format!("Unknown transaction {}", hash))?;
    let receipt = provider
        .transaction_receipt(hash)
        .await?
        .with_context(|| format!("No receipt for {}", hash))?;

    let fees = match (tx.gas_price, tx.max_priority_fee_per_gas, tx.max_fee_per_gas) {
        (Some(price), _, _) => format!("gasPrice {} gwei", format_gwei(price)),
        (None, Some(priority), Some(max)) => format!(
            "maxPriorityFeePerGas {} gwei, maxFeePerGas {} gwei",
            format_gwei(priority),
            format_gwei(max)
        ),
        _ => "no fee fields".to_string(),
    };
    info!(
        "{}: {} tx {} in block {}, status {:?}, gas {}/{}, {}, paid {} ETH, {} logs",
        label,
        tx.tx_type,
        hash,
        receipt.block_number,
        receipt.status,
        receipt.gas_used,
        tx.gas_limit,
        fees,
        format_ether(receipt.fee_paid()),
        receipt.logs.len()
    );
    Ok(())
}
