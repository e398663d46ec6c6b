/*
[INPUT]:  Wallet, verifier and transport failures
[OUTPUT]: Sign-in error taxonomy reported to the UI layer as values
[POS]:    Auth layer - error kinds for the sign-in flow
[UPDATE]: When a new failure mode or verifier rejection code appears
*/

use thiserror::Error;

use crate::env::EnvError;
use crate::http::PlaygroundError;

/// Wallet feature that may or may not be offered by a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletFeature {
    SignMessage,
    SignTransaction,
    SendTransaction,
}

/// Errors raised by a wallet implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("user rejected the request: {0}")]
    Rejected(String),

    #[error("wallet does not support {0:?}")]
    Unsupported(WalletFeature),

    #[error("account {0} is not connected to this wallet")]
    UnknownAccount(String),

    #[error("wallet is disconnected")]
    Disconnected,

    #[error("wallet transport failed: {0}")]
    Transport(String),
}

/// Reasons the backend verifier refuses a signed challenge
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("signature does not verify")]
    InvalidSignature,

    #[error("signer public key does not match the challenge address")]
    AddressMismatch,

    #[error("challenge has expired")]
    Expired,

    #[error("nonce was already used")]
    NonceReused,

    #[error("challenge domain is not accepted")]
    DomainMismatch,

    #[error("verifier rejected the sign-in: {message}")]
    Rejected { message: String },
}

impl VerificationError {
    /// Map a backend rejection code to a variant
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "INVALID_SIGNATURE" => VerificationError::InvalidSignature,
            "ADDRESS_MISMATCH" => VerificationError::AddressMismatch,
            "EXPIRED" | "CHALLENGE_EXPIRED" => VerificationError::Expired,
            "NONCE_REUSED" | "INVALID_NONCE" => VerificationError::NonceReused,
            "DOMAIN_MISMATCH" => VerificationError::DomainMismatch,
            _ => VerificationError::Rejected {
                message: message.into(),
            },
        }
    }
}

/// Discriminant of [`SignInError`] used by UI state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInErrorKind {
    UserRejected,
    VerificationError,
    TransportError,
    ConfigurationError,
    Cancelled,
}

/// Outcome of a failed sign-in attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignInError {
    #[error("sign-in was rejected: {reason}")]
    UserRejected { reason: String },

    #[error("verification failed: {0}")]
    Verification(#[from] VerificationError),

    #[error("network failure: {message}")]
    Transport { message: String },

    #[error("no response after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("sign-in attempt was abandoned")]
    Cancelled,
}

impl SignInError {
    pub fn kind(&self) -> SignInErrorKind {
        match self {
            SignInError::UserRejected { .. } => SignInErrorKind::UserRejected,
            SignInError::Verification(_) => SignInErrorKind::VerificationError,
            SignInError::Transport { .. } | SignInError::Timeout { .. } => {
                SignInErrorKind::TransportError
            }
            SignInError::Configuration { .. } => SignInErrorKind::ConfigurationError,
            SignInError::Cancelled => SignInErrorKind::Cancelled,
        }
    }

    /// Everything except configuration problems can be retried with a fresh challenge
    pub fn is_retryable(&self) -> bool {
        self.kind() != SignInErrorKind::ConfigurationError
    }
}

impl From<WalletError> for SignInError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Rejected(reason) => SignInError::UserRejected { reason },
            WalletError::Unsupported(feature) => SignInError::UserRejected {
                reason: format!("wallet cannot {feature:?}"),
            },
            WalletError::UnknownAccount(address) => SignInError::UserRejected {
                reason: format!("account {address} is not connected"),
            },
            WalletError::Disconnected => SignInError::UserRejected {
                reason: "wallet is disconnected".to_string(),
            },
            WalletError::Transport(message) => SignInError::Transport { message },
        }
    }
}

impl From<PlaygroundError> for SignInError {
    fn from(err: PlaygroundError) -> Self {
        match err {
            PlaygroundError::Timeout { duration } => SignInError::Timeout { seconds: duration },
            PlaygroundError::Config(message) => SignInError::Configuration { message },
            PlaygroundError::UrlParse(e) => SignInError::Configuration {
                message: e.to_string(),
            },
            other => SignInError::Transport {
                message: other.to_string(),
            },
        }
    }
}

impl From<EnvError> for SignInError {
    fn from(err: EnvError) -> Self {
        SignInError::Configuration {
            message: err.to_string(),
        }
    }
}
