/*
[INPUT]:  Process environment variables
[OUTPUT]: Validated application environment
[POS]:    Configuration layer - startup settings for auth, database and Solana
[UPDATE]: When adding environment variables or tightening validation
*/

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::types::{Cluster, NodeEnv};

const MIN_SECRET_LEN: usize = 32;

/// Variables read from the environment; everything else is ignored
const KEYS: &[&str] = &[
    "BETTER_AUTH_SECRET",
    "BETTER_AUTH_URL",
    "CORS_ORIGIN",
    "DATABASE_AUTH_TOKEN",
    "DATABASE_URL",
    "NODE_ENV",
    "SOLANA_CLUSTER",
    "SOLANA_EMAIL_DOMAIN",
    "SOLANA_ENDPOINT",
];

/// Environment loading or validation failure. Fatal at startup.
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("failed to load environment: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Application environment
#[derive(Clone, Deserialize)]
pub struct AppEnv {
    pub better_auth_secret: String,
    pub better_auth_url: String,
    pub cors_origin: String,
    pub database_auth_token: String,
    pub database_url: String,
    #[serde(default)]
    pub node_env: NodeEnv,
    #[serde(default)]
    pub solana_cluster: Cluster,
    #[serde(default = "default_email_domain")]
    pub solana_email_domain: String,
    #[serde(default = "default_solana_endpoint")]
    pub solana_endpoint: String,
}

fn default_email_domain() -> String {
    "example.com".to_string()
}

fn default_solana_endpoint() -> String {
    "https://api.devnet.solana.com".to_string()
}

impl AppEnv {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_vars(std::env::vars())
    }

    /// Load from an explicit set of variables. Empty values count as unset.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, EnvError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source: ::config::Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .filter(|(key, value)| KEYS.contains(&key.as_str()) && !value.trim().is_empty())
            .collect();

        let settings = ::config::Config::builder()
            .add_source(::config::Environment::default().source(Some(source)))
            .build()?;
        let env: AppEnv = settings.try_deserialize()?;
        env.validate()?;
        Ok(env)
    }

    fn validate(&self) -> Result<(), EnvError> {
        if self.better_auth_secret.chars().count() < MIN_SECRET_LEN {
            return Err(EnvError::Invalid {
                key: "BETTER_AUTH_SECRET",
                reason: format!("must be at least {MIN_SECRET_LEN} characters"),
            });
        }
        parse_url("BETTER_AUTH_URL", &self.better_auth_url)?;
        parse_url("SOLANA_ENDPOINT", &self.solana_endpoint)?;
        if self.allowed_origins().is_empty() {
            return Err(EnvError::Invalid {
                key: "CORS_ORIGIN",
                reason: "no origins listed".to_string(),
            });
        }
        for origin in self.allowed_origins() {
            parse_url("CORS_ORIGIN", origin)?;
        }
        if self.solana_email_domain.trim().is_empty() || self.solana_email_domain.contains('@') {
            return Err(EnvError::Invalid {
                key: "SOLANA_EMAIL_DOMAIN",
                reason: format!("{:?} is not a bare domain", self.solana_email_domain),
            });
        }
        Ok(())
    }

    /// Origins allowed to call the auth backend
    pub fn allowed_origins(&self) -> Vec<&str> {
        self.cors_origin
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .collect()
    }

    /// E-mail assigned to accounts created from a wallet sign-in
    pub fn synthetic_email(&self, address: &str) -> String {
        format!("{}@{}", address.trim(), self.solana_email_domain.trim())
    }

    /// Domain presented in sign-in messages, taken from the auth URL
    pub fn sign_in_domain(&self) -> String {
        Url::parse(&self.better_auth_url)
            .ok()
            .and_then(|url| {
                url.host_str().map(|host| match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                })
            })
            .unwrap_or_else(|| self.better_auth_url.clone())
    }
}

impl fmt::Debug for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppEnv")
            .field("better_auth_secret", &"<redacted>")
            .field("better_auth_url", &self.better_auth_url)
            .field("cors_origin", &self.cors_origin)
            .field("database_auth_token", &"<redacted>")
            .field("database_url", &"<redacted>")
            .field("node_env", &self.node_env)
            .field("solana_cluster", &self.solana_cluster)
            .field("solana_email_domain", &self.solana_email_domain)
            .field("solana_endpoint", &self.solana_endpoint)
            .finish()
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, EnvError> {
    Url::parse(value.trim()).map_err(|e| EnvError::Invalid {
        key,
        reason: format!("{value:?} is not a URL: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("BETTER_AUTH_SECRET", "0123456789abcdef0123456789abcdef"),
            ("BETTER_AUTH_URL", "http://localhost:3000"),
            ("CORS_ORIGIN", "http://localhost:3001"),
            ("DATABASE_AUTH_TOKEN", "token"),
            ("DATABASE_URL", "file:local.db"),
        ]
    }

    fn with(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut vars: Vec<_> = base_vars()
            .into_iter()
            .filter(|(key, _)| !overrides.iter().any(|(k, _)| k == key))
            .collect();
        vars.extend_from_slice(overrides);
        vars
    }

    #[test]
    fn test_defaults_applied() {
        let env = AppEnv::from_vars(base_vars()).unwrap();
        assert_eq!(env.node_env, NodeEnv::Development);
        assert_eq!(env.solana_cluster, Cluster::Devnet);
        assert_eq!(env.solana_email_domain, "example.com");
        assert_eq!(env.solana_endpoint, "https://api.devnet.solana.com");
        assert_eq!(env.sign_in_domain(), "localhost:3000");
    }

    #[test]
    fn test_explicit_values() {
        let env = AppEnv::from_vars(with(&[
            ("SOLANA_CLUSTER", "localnet"),
            ("NODE_ENV", "production"),
            ("SOLANA_ENDPOINT", "http://127.0.0.1:8899"),
            ("CORS_ORIGIN", "http://a.test, http://b.test"),
        ]))
        .unwrap();
        assert_eq!(env.solana_cluster, Cluster::Localnet);
        assert_eq!(env.node_env, NodeEnv::Production);
        assert_eq!(env.allowed_origins(), vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_empty_string_is_unset() {
        let env = AppEnv::from_vars(with(&[("SOLANA_EMAIL_DOMAIN", "")])).unwrap();
        assert_eq!(env.solana_email_domain, "example.com");

        let err = AppEnv::from_vars(with(&[("DATABASE_URL", "  ")])).unwrap_err();
        assert!(matches!(err, EnvError::Load(_)));
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = AppEnv::from_vars(with(&[("BETTER_AUTH_SECRET", "short")])).unwrap_err();
        assert!(matches!(err, EnvError::Invalid { key: "BETTER_AUTH_SECRET", .. }));
    }

    #[test]
    fn test_bad_url_rejected() {
        let err = AppEnv::from_vars(with(&[("BETTER_AUTH_URL", "localhost")])).unwrap_err();
        assert!(matches!(err, EnvError::Invalid { key: "BETTER_AUTH_URL", .. }));
    }

    #[test]
    fn test_cluster_aliases_accepted() {
        let env = AppEnv::from_vars(with(&[("SOLANA_CLUSTER", "mainnet-beta")])).unwrap();
        assert_eq!(env.solana_cluster, Cluster::Mainnet);
        let env = AppEnv::from_vars(with(&[("SOLANA_CLUSTER", "Testnet")])).unwrap();
        assert_eq!(env.solana_cluster, Cluster::Testnet);
    }

    #[test]
    fn test_unknown_cluster_rejected() {
        assert!(AppEnv::from_vars(with(&[("SOLANA_CLUSTER", "moonnet")])).is_err());
    }

    #[test]
    fn test_synthetic_email_and_redacted_debug() {
        let env = AppEnv::from_vars(with(&[("SOLANA_EMAIL_DOMAIN", "wallets.test")])).unwrap();
        assert_eq!(env.synthetic_email("Abc123"), "Abc123@wallets.test");

        let debug = format!("{env:?}");
        assert!(!debug.contains("0123456789abcdef"));
        assert!(debug.contains("<redacted>"));
    }
}
