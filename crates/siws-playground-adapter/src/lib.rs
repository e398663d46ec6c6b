/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public SIWS playground crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod context;
pub mod env;
pub mod explorer;
pub mod http;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    BackendVerifier,
    ChallengeBuilder,
    DomainConfig,
    HttpVerifier,
    KeyStore,
    KeypairWallet,
    LocalVerifier,
    MockWallet,
    OrchestratorConfig,
    SessionCache,
    SessionEvent,
    SignInError,
    SignInErrorKind,
    SignInOrchestrator,
    SignInState,
    VerificationError,
    Wallet,
    WalletAccount,
    WalletCapabilities,
    WalletError,
    verify_signature,
};

pub use context::{ActionError, AppContext};
pub use env::{AppEnv, EnvError};

// Re-export commonly used types from http
pub use http::{ClientConfig, PlaygroundClient, PlaygroundError, Result};

// Re-export all types
pub use types::*;
