/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and stub collaborators
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for siws-playground-adapter tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use siws_playground_adapter::{
    BackendVerifier, ChallengeBuilder, DomainConfig, OrchestratorConfig, Session, SessionCache,
    SignInError, SignInOrchestrator, SignedMessage,
};
use wiremock::MockServer;

pub const DOMAIN: &str = "localhost:3000";
pub const PLAYGROUND_ADDRESS: &str = "SEekKY1iUoWYJqZ3d9QBsfJytNx5RLBjBmgznkGrqbH";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Verifier that accepts every challenge after an optional delay
#[derive(Debug, Default)]
pub struct StubVerifier {
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubVerifier {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendVerifier for StubVerifier {
    async fn verify(&self, signed: &SignedMessage) -> Result<Session, SignInError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let now = Utc::now();
        Ok(Session {
            user_id: format!("user-{}", signed.challenge.nonce),
            wallet_address: signed.challenge.address.to_string(),
            issued_at: now,
            expires_at: now + chrono::Duration::hours(1),
            token: None,
        })
    }
}

/// Orchestrator for `DOMAIN` backed by the given verifier
pub fn orchestrator_with(verifier: Arc<dyn BackendVerifier>) -> SignInOrchestrator {
    let builder = ChallengeBuilder::new(DomainConfig::new(DOMAIN, "http://localhost:3000"));
    SignInOrchestrator::new(
        builder,
        verifier,
        SessionCache::new(),
        OrchestratorConfig::default(),
    )
}

/// Minimal valid environment pointing both URLs at `server`
pub fn test_env(server: &MockServer) -> Vec<(String, String)> {
    vec![
        ("BETTER_AUTH_SECRET".into(), "0123456789abcdef0123456789abcdef".into()),
        ("BETTER_AUTH_URL".into(), server.uri()),
        ("CORS_ORIGIN".into(), "http://localhost:3001".into()),
        ("DATABASE_AUTH_TOKEN".into(), "token".into()),
        ("DATABASE_URL".into(), "file:local.db".into()),
        ("SOLANA_CLUSTER".into(), "localnet".into()),
        ("SOLANA_ENDPOINT".into(), server.uri()),
    ]
}
