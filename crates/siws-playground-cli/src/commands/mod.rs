/*
[INPUT]:  Process environment
[OUTPUT]: Application contexts and subcommand implementations
[POS]:    CLI command layer
[UPDATE]: When adding subcommands or changing context wiring
*/

pub mod balance;
pub mod sign_in;
pub mod wallet;

use std::sync::Arc;

use anyhow::{Context, Result};
use siws_playground_adapter::{
    AppContext, AppEnv, ClientConfig, LocalVerifier, OrchestratorConfig, PlaygroundClient,
};

/// Context that verifies sign-ins against the auth backend
pub fn load_context() -> Result<AppContext> {
    let env = AppEnv::from_env().context("load environment")?;
    AppContext::new(env, ClientConfig::default()).context("build application context")
}

/// Context that verifies sign-ins in-process
pub fn load_local_context() -> Result<AppContext> {
    let env = AppEnv::from_env().context("load environment")?;
    local_context(env)
}

pub(crate) fn local_context(env: AppEnv) -> Result<AppContext> {
    let client = PlaygroundClient::with_config_and_urls(
        ClientConfig::default(),
        &env.solana_endpoint,
        &env.better_auth_url,
    )
    .context("build http client")?;
    let verifier = Arc::new(LocalVerifier::new(env.sign_in_domain()));
    Ok(AppContext::with_verifier(
        env,
        client,
        verifier,
        OrchestratorConfig::default(),
    ))
}

#[cfg(test)]
pub(crate) fn test_env(endpoint: &str) -> AppEnv {
    AppEnv::from_vars([
        ("BETTER_AUTH_SECRET", "0123456789abcdef0123456789abcdef"),
        ("BETTER_AUTH_URL", "http://localhost:3000"),
        ("CORS_ORIGIN", "http://localhost:3001"),
        ("DATABASE_AUTH_TOKEN", "token"),
        ("DATABASE_URL", "file:local.db"),
        ("SOLANA_CLUSTER", "localnet"),
        ("SOLANA_ENDPOINT", endpoint),
    ])
    .unwrap()
}
