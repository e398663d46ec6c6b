/*
[INPUT]:  Validated environment, client configuration, connected wallets
[OUTPUT]: Sign-in, balance, signing and explorer operations for the UI layer
[POS]:    Application context - explicitly passed state created at startup
[UPDATE]: When a new playground operation is exposed to the UI
*/

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::auth::{
    BackendVerifier, ChallengeBuilder, DomainConfig, HttpVerifier, OrchestratorConfig,
    SessionCache, SignInError, SignInOrchestrator, Wallet, WalletAccount, WalletError,
    WalletFeature,
};
use crate::env::AppEnv;
use crate::explorer;
use crate::http::{ClientConfig, PlaygroundClient, PlaygroundError};
use crate::types::{Lamports, Session, WalletAddress};

/// Failure of a playground wallet operation
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Rpc(#[from] PlaygroundError),
}

/// Everything the UI needs, created once on startup and dropped on teardown
pub struct AppContext {
    env: AppEnv,
    client: PlaygroundClient,
    sessions: SessionCache,
    orchestrator: SignInOrchestrator,
}

impl AppContext {
    /// Build a context that verifies sign-ins against the auth backend
    pub fn new(env: AppEnv, config: ClientConfig) -> Result<Self, PlaygroundError> {
        let client =
            PlaygroundClient::with_config_and_urls(config, &env.solana_endpoint, &env.better_auth_url)?;
        let verifier = Arc::new(HttpVerifier::new(client.clone()));
        Ok(Self::with_verifier(
            env,
            client,
            verifier,
            OrchestratorConfig::default(),
        ))
    }

    pub fn with_verifier(
        env: AppEnv,
        client: PlaygroundClient,
        verifier: Arc<dyn BackendVerifier>,
        config: OrchestratorConfig,
    ) -> Self {
        let domain = DomainConfig::new(env.sign_in_domain(), env.better_auth_url.clone())
            .with_cluster(env.solana_cluster);
        let sessions = SessionCache::new();
        let orchestrator = SignInOrchestrator::new(
            ChallengeBuilder::new(domain),
            verifier,
            sessions.clone(),
            config,
        );
        info!(cluster = %env.solana_cluster, endpoint = %env.solana_endpoint, "application context ready");
        Self {
            env,
            client,
            sessions,
            orchestrator,
        }
    }

    pub fn env(&self) -> &AppEnv {
        &self.env
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    pub fn orchestrator(&self) -> &SignInOrchestrator {
        &self.orchestrator
    }

    pub async fn sign_in(
        &self,
        wallet: Arc<dyn Wallet>,
        account: &WalletAccount,
    ) -> Result<Session, SignInError> {
        self.orchestrator.sign_in(wallet, account).await
    }

    pub fn session(&self) -> Option<Session> {
        self.sessions.session()
    }

    /// Clear the session and drop any sign-in still in flight
    pub fn sign_out(&self) {
        self.orchestrator.abandon_all();
        self.sessions.clear();
    }

    /// Balance of a user-entered address
    pub async fn balance(&self, address: &str) -> Result<Lamports, PlaygroundError> {
        let address = WalletAddress::parse(address)?;
        self.client.get_balance(&address).await
    }

    /// Sign a UTF-8 message and return the base58 signature
    pub async fn sign_message(
        &self,
        wallet: &dyn Wallet,
        account: &WalletAccount,
        message: &str,
    ) -> Result<String, ActionError> {
        wallet.capabilities().require(WalletFeature::SignMessage)?;
        let signature = wallet.sign_message(account, message.as_bytes()).await?;
        Ok(bs58::encode(signature).into_string())
    }

    /// Sign a serialized single-signer transaction message and return the wire transaction
    pub async fn sign_transaction(
        &self,
        wallet: &dyn Wallet,
        account: &WalletAccount,
        message: &[u8],
    ) -> Result<Vec<u8>, ActionError> {
        wallet.capabilities().require(WalletFeature::SignTransaction)?;
        let signature = wallet.sign_transaction(account, message).await?;
        Ok(encode_single_signer_transaction(&signature, message))
    }

    /// Sign a transaction message and submit it, returning the transaction signature
    pub async fn sign_and_send_transaction(
        &self,
        wallet: &dyn Wallet,
        account: &WalletAccount,
        message: &[u8],
    ) -> Result<String, ActionError> {
        wallet.capabilities().require(WalletFeature::SendTransaction)?;
        let transaction = self.sign_transaction(wallet, account, message).await?;
        Ok(self.client.send_transaction(&transaction).await?)
    }

    /// Explorer link on the configured cluster
    pub fn explorer_url(&self, path: &str) -> String {
        explorer::explorer_url(self.env.solana_cluster, &self.env.solana_endpoint, path)
    }
}

/// Wire format: compact-u16 signature count, signatures, message
fn encode_single_signer_transaction(signature: &[u8], message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + signature.len() + message.len());
    out.push(1);
    out.extend_from_slice(signature);
    out.extend_from_slice(message);
    out
}
