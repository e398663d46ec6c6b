/*
[INPUT]:  Wallets, domain settings and verifier backends
[OUTPUT]: Sessions, sign-in state and typed sign-in errors
[POS]:    Auth layer - Sign-In-With-Solana flow
[UPDATE]: When auth flow or signature methods change
*/

pub mod challenge;
pub mod error;
pub mod key_store;
pub mod keypair;
pub mod orchestrator;
pub mod session;
pub mod state;
pub mod verifier;
pub mod wallet;

pub use challenge::{ChallengeBuilder, DomainConfig, generate_nonce};
pub use error::{SignInError, SignInErrorKind, VerificationError, WalletError, WalletFeature};
pub use key_store::KeyStore;
pub use keypair::{KeypairWallet, verify_signature};
pub use orchestrator::{OrchestratorConfig, SignInOrchestrator};
pub use session::{SessionCache, SessionEvent};
pub use state::{SignInAction, SignInState, SignInStateMachine};
pub use verifier::{BackendVerifier, HttpVerifier, LocalVerifier};
pub use wallet::{MockReply, MockWallet, Wallet, WalletAccount, WalletCapabilities};
