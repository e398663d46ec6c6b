/*
[INPUT]:  Wallet address and domain settings
[OUTPUT]: Sign-in challenges with fresh nonces and their canonical message text
[POS]:    Auth layer - SIWS challenge construction
[UPDATE]: When the sign-in message layout or nonce policy changes
*/

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::types::{Cluster, SignInChallenge, WalletAddress};

/// Nonce entropy in bytes (128 bits)
pub const NONCE_BYTES: usize = 16;

/// Message version written into every challenge
pub const MESSAGE_VERSION: &str = "1";

const DEFAULT_STATEMENT: &str = "Sign in with your Solana account.";

/// Challenge lifetime when none is configured
pub fn default_challenge_ttl() -> Duration {
    Duration::minutes(10)
}

/// Settings describing who is asking the wallet to sign in
#[derive(Debug, Clone)]
pub struct DomainConfig {
    pub domain: String,
    pub uri: String,
    pub statement: String,
    pub cluster: Cluster,
    pub ttl: Duration,
}

impl DomainConfig {
    pub fn new(domain: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            uri: uri.into(),
            statement: DEFAULT_STATEMENT.to_string(),
            cluster: Cluster::default(),
            ttl: default_challenge_ttl(),
        }
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = statement.into();
        self
    }

    pub fn with_cluster(mut self, cluster: Cluster) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Builds one challenge per sign-in attempt
#[derive(Debug, Clone)]
pub struct ChallengeBuilder {
    config: DomainConfig,
}

impl ChallengeBuilder {
    /// Panics on a domain config that cannot produce a well-formed message.
    pub fn new(config: DomainConfig) -> Self {
        assert!(!config.domain.trim().is_empty(), "sign-in domain must not be empty");
        assert!(
            !config.domain.contains('\n') && !config.uri.contains('\n'),
            "sign-in domain and uri must be single-line"
        );
        assert!(
            !config.statement.contains('\n'),
            "sign-in statement must be single-line"
        );
        assert!(config.ttl > Duration::zero(), "challenge ttl must be positive");
        Self { config }
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }

    /// Challenge issued now for `address`
    pub fn build(&self, address: &WalletAddress) -> SignInChallenge {
        self.build_at(address, Utc::now())
    }

    pub fn build_at(&self, address: &WalletAddress, issued_at: DateTime<Utc>) -> SignInChallenge {
        SignInChallenge {
            domain: self.config.domain.clone(),
            address: address.clone(),
            statement: self.config.statement.clone(),
            uri: self.config.uri.clone(),
            version: MESSAGE_VERSION.to_string(),
            chain_id: self.config.cluster.chain_id(),
            nonce: generate_nonce(),
            issued_at,
            expiration_time: Some(issued_at + self.config.ttl),
        }
    }
}

/// Hex-encoded random nonce from the OS RNG
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl SignInChallenge {
    /// Canonical text the wallet signs
    pub fn to_message(&self) -> String {
        let mut lines = vec![
            format!("{} wants you to sign in with your Solana account:", self.domain),
            self.address.to_string(),
        ];
        if !self.statement.is_empty() {
            lines.push(String::new());
            lines.push(self.statement.clone());
        }
        lines.push(String::new());
        if !self.uri.is_empty() {
            lines.push(format!("URI: {}", self.uri));
        }
        lines.push(format!("Version: {}", self.version));
        lines.push(format!("Chain ID: {}", self.chain_id));
        lines.push(format!("Nonce: {}", self.nonce));
        lines.push(format!("Issued At: {}", timestamp(&self.issued_at)));
        if let Some(expires) = &self.expiration_time {
            lines.push(format!("Expiration Time: {}", timestamp(expires)));
        }
        lines.join("\n")
    }

    pub fn message_bytes(&self) -> Vec<u8> {
        self.to_message().into_bytes()
    }
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
