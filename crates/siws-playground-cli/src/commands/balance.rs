/*
[INPUT]:  User-entered wallet address
[OUTPUT]: Formatted SOL balance
[POS]:    CLI command layer - balance lookup
[UPDATE]: When balance output changes
*/

use anyhow::{Context, Result};
use siws_playground_adapter::AppContext;
use tracing::info;

pub async fn run(ctx: &AppContext, address: &str) -> Result<String> {
    let balance = ctx
        .balance(address)
        .await
        .with_context(|| format!("fetch balance of {}", address.trim()))?;
    info!(address = address.trim(), lamports = balance.0, "balance fetched");
    Ok(balance.to_string())
}
