/*
[INPUT]:  Application context, local wallet, cancellation token
[OUTPUT]: Authenticated session or signed message
[POS]:    CLI command layer - sign-in and message signing
[UPDATE]: When sign-in flow or output changes
*/

use std::sync::Arc;

use anyhow::{Result, bail};
use siws_playground_adapter::{AppContext, KeypairWallet, Session, Wallet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Sign in, abandoning the attempt if `shutdown` fires first
pub async fn run(ctx: &AppContext, wallet: Arc<dyn Wallet>, shutdown: CancellationToken) -> Result<Session> {
    let account = match wallet.primary_account() {
        Some(account) => account,
        None => bail!("wallet has no accounts"),
    };
    info!(address = %account.address, "requesting sign-in");

    tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            warn!(address = %account.address, "sign-in interrupted");
            ctx.orchestrator().abandon(&account.address);
            bail!("sign-in interrupted")
        }
        result = ctx.sign_in(wallet.clone(), &account) => Ok(result?),
    }
}

pub async fn sign_message(ctx: &AppContext, wallet: &KeypairWallet, message: &str) -> Result<String> {
    let account = match wallet.primary_account() {
        Some(account) => account,
        None => bail!("wallet has no accounts"),
    };
    Ok(ctx.sign_message(wallet, &account, message).await?)
}
