/*
[INPUT]:  Connected wallet, account, challenge builder and backend verifier
[OUTPUT]: Session or SignInError per attempt, observable SignInState per account
[POS]:    Auth layer - orchestrates the complete sign-in flow
[UPDATE]: When flow steps, coalescing or cancellation rules change
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::challenge::ChallengeBuilder;
use super::error::{SignInError, VerificationError, WalletError, WalletFeature};
use super::session::SessionCache;
use super::state::{SignInAction, SignInState, SignInStateMachine};
use super::verifier::BackendVerifier;
use super::wallet::{Wallet, WalletAccount};
use crate::types::{Session, SignedMessage, WalletAddress};

type SharedAttempt = Shared<BoxFuture<'static, Result<Session, SignInError>>>;

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on each wallet or backend round-trip
    pub ui_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ui_timeout: Duration::from_secs(60),
        }
    }
}

/// Per-account flow bookkeeping
struct AccountFlow {
    generation: u64,
    machine: SignInStateMachine,
    state_tx: watch::Sender<SignInState>,
    in_flight: Option<SharedAttempt>,
}

impl AccountFlow {
    fn new() -> Self {
        let (state_tx, _) = watch::channel(SignInState::Idle);
        Self {
            generation: 0,
            machine: SignInStateMachine::new(),
            state_tx,
            in_flight: None,
        }
    }

    fn is_observed(&self) -> bool {
        self.state_tx.receiver_count() > 0
    }

    fn apply(&mut self, address: &WalletAddress, action: SignInAction) {
        match self.machine.transition(action) {
            Ok(state) => {
                debug!(address = %address, state = state.name(), "sign-in state changed");
                self.state_tx.send_replace(state.clone());
            }
            Err(err) => warn!(address = %address, error = %err, "ignored sign-in transition"),
        }
    }
}

struct Inner {
    builder: ChallengeBuilder,
    verifier: Arc<dyn BackendVerifier>,
    sessions: SessionCache,
    config: OrchestratorConfig,
    flows: Mutex<HashMap<WalletAddress, AccountFlow>>,
    /// Shared across accounts so a recreated flow never reuses a generation
    generations: AtomicU64,
}

/// Drives Sign-In-With-Solana attempts, one at a time per account
#[derive(Clone)]
pub struct SignInOrchestrator {
    inner: Arc<Inner>,
}

impl SignInOrchestrator {
    pub fn new(
        builder: ChallengeBuilder,
        verifier: Arc<dyn BackendVerifier>,
        sessions: SessionCache,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                builder,
                verifier,
                sessions,
                config,
                flows: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.inner.sessions
    }

    /// Current state for an account
    pub fn state(&self, address: &WalletAddress) -> SignInState {
        let flows = self.inner.flows.lock().unwrap();
        flows
            .get(address)
            .map(|flow| flow.machine.state().clone())
            .unwrap_or_default()
    }

    /// Watch state changes for an account
    pub fn subscribe(&self, address: &WalletAddress) -> watch::Receiver<SignInState> {
        let mut flows = self.inner.flows.lock().unwrap();
        flows
            .entry(address.clone())
            .or_insert_with(AccountFlow::new)
            .state_tx
            .subscribe()
    }

    /// Run a sign-in for `account`.
    ///
    /// A call made while an attempt for the same account is in flight joins
    /// that attempt instead of starting another. A call made after a terminal
    /// state starts over with a new challenge.
    pub async fn sign_in(
        &self,
        wallet: Arc<dyn Wallet>,
        account: &WalletAccount,
    ) -> Result<Session, SignInError> {
        let attempt = self.start_or_join(wallet, account);
        attempt.await
    }

    fn start_or_join(&self, wallet: Arc<dyn Wallet>, account: &WalletAccount) -> SharedAttempt {
        let address = &account.address;
        let mut flows = self.inner.flows.lock().unwrap();
        let flow = flows
            .entry(address.clone())
            .or_insert_with(AccountFlow::new);

        if let Some(existing) = &flow.in_flight {
            info!(address = %address, "joining in-flight sign-in");
            return existing.clone();
        }

        if flow.machine.state().is_terminal() {
            flow.apply(address, SignInAction::Reset);
        }
        flow.generation = self.inner.next_generation();
        flow.apply(address, SignInAction::Start);
        info!(address = %address, generation = flow.generation, wallet = wallet.name(), "starting sign-in");

        let handle = tokio::spawn(run_attempt(
            self.inner.clone(),
            wallet,
            account.clone(),
            flow.generation,
        ));
        let attempt = async move {
            match handle.await {
                Ok(result) => result,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(_) => Err(SignInError::Cancelled),
            }
        }
        .boxed()
        .shared();

        flow.in_flight = Some(attempt.clone());
        attempt
    }

    /// Stop tracking the current attempt for an account.
    ///
    /// Network calls already made are left to finish, but their outcome is
    /// discarded: callers receive `Cancelled` and the session cache is not written.
    pub fn abandon(&self, address: &WalletAddress) {
        let mut flows = self.inner.flows.lock().unwrap();
        let Some(flow) = flows.get_mut(address) else {
            return;
        };
        abandon_flow(address, flow, self.inner.next_generation());
        if !flow.is_observed() {
            flows.remove(address);
        }
    }

    /// Abandon every account's attempt, e.g. on sign-out.
    ///
    /// Flows nobody is watching are dropped.
    pub fn abandon_all(&self) {
        let mut flows = self.inner.flows.lock().unwrap();
        for (address, flow) in flows.iter_mut() {
            abandon_flow(address, flow, self.inner.next_generation());
        }
        flows.retain(|_, flow| flow.is_observed());
    }
}

fn abandon_flow(address: &WalletAddress, flow: &mut AccountFlow, generation: u64) {
    if flow.in_flight.is_some() {
        info!(address = %address, generation = flow.generation, "abandoning sign-in");
    }
    flow.generation = generation;
    flow.in_flight = None;
    flow.apply(address, SignInAction::Reset);
}

async fn run_attempt(
    inner: Arc<Inner>,
    wallet: Arc<dyn Wallet>,
    account: WalletAccount,
    generation: u64,
) -> Result<Session, SignInError> {
    let outcome = inner.attempt(wallet.as_ref(), &account, generation).await;
    inner.finish(&account.address, generation, outcome)
}

impl Inner {
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn attempt(
        &self,
        wallet: &dyn Wallet,
        account: &WalletAccount,
        generation: u64,
    ) -> Result<Session, SignInError> {
        wallet.capabilities().require(WalletFeature::SignMessage)?;
        if !wallet.accounts().contains(account) {
            return Err(WalletError::UnknownAccount(account.address.to_string()).into());
        }

        let challenge = self.builder.build(&account.address);
        debug!(address = %account.address, nonce = %challenge.nonce, "issued sign-in challenge");

        let message = challenge.message_bytes();
        let signature = self
            .bounded(wallet.sign_message(account, &message))
            .await?
            .map_err(SignInError::from)?;

        if !self.advance(&account.address, generation, SignInAction::Signed) {
            return Err(SignInError::Cancelled);
        }

        let signed = SignedMessage {
            challenge,
            signature,
            signer_public_key: account.address.to_bytes().to_vec(),
        };
        let session = self.bounded(self.verifier.verify(&signed)).await??;

        if session.wallet_address != account.address.as_str() {
            warn!(
                expected = %account.address,
                actual = %session.wallet_address,
                "verifier issued a session for another wallet"
            );
            return Err(VerificationError::AddressMismatch.into());
        }
        Ok(session)
    }

    /// Apply the UI timeout to one round-trip
    async fn bounded<T>(
        &self,
        call: impl Future<Output = T>,
    ) -> Result<T, SignInError> {
        timeout(self.config.ui_timeout, call)
            .await
            .map_err(|_| SignInError::Timeout {
                seconds: self.config.ui_timeout.as_secs(),
            })
    }

    /// Apply a transition if `generation` is still current
    fn advance(&self, address: &WalletAddress, generation: u64, action: SignInAction) -> bool {
        let mut flows = self.flows.lock().unwrap();
        match flows.get_mut(address) {
            Some(flow) if flow.generation == generation => {
                flow.apply(address, action);
                true
            }
            _ => false,
        }
    }

    fn finish(
        &self,
        address: &WalletAddress,
        generation: u64,
        outcome: Result<Session, SignInError>,
    ) -> Result<Session, SignInError> {
        let mut flows = self.flows.lock().unwrap();
        let flow = match flows.get_mut(address) {
            Some(flow) if flow.generation == generation => flow,
            _ => {
                info!(address = %address, generation, "discarding result of abandoned sign-in");
                return Err(SignInError::Cancelled);
            }
        };

        flow.in_flight = None;
        match &outcome {
            Ok(session) => {
                flow.apply(address, SignInAction::Verified(session.clone()));
                self.sessions.set_session(session.clone());
                info!(address = %address, user_id = %session.user_id, "signed in");
            }
            Err(err) => {
                flow.apply(address, SignInAction::Fail(err.kind()));
                warn!(address = %address, error = %err, "sign-in failed");
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::challenge::DomainConfig;
    use crate::auth::keypair::KeypairWallet;
    use crate::auth::verifier::LocalVerifier;
    use crate::auth::wallet::{MockReply, MockWallet, WalletCapabilities};
    use crate::auth::SignInErrorKind;

    const DOMAIN: &str = "localhost:3000";

    fn orchestrator(verifier: Arc<LocalVerifier>, config: OrchestratorConfig) -> SignInOrchestrator {
        let builder = ChallengeBuilder::new(DomainConfig::new(DOMAIN, "http://localhost:3000"));
        SignInOrchestrator::new(builder, verifier, SessionCache::new(), config)
    }

    fn nonce_of(message: &[u8]) -> String {
        String::from_utf8_lossy(message)
            .lines()
            .find_map(|line| line.strip_prefix("Nonce: "))
            .map(str::to_string)
            .unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_authenticates() {
        let verifier = Arc::new(LocalVerifier::new(DOMAIN));
        let orchestrator = orchestrator(verifier.clone(), OrchestratorConfig::default());
        let wallet = Arc::new(KeypairWallet::generate());
        let account = wallet.primary_account().unwrap();
        let mut events = orchestrator.sessions().subscribe();

        let session = orchestrator.sign_in(wallet.clone(), &account).await.unwrap();

        assert_eq!(session.wallet_address, account.address.to_string());
        assert_eq!(
            orchestrator.state(&account.address),
            SignInState::Authenticated(session.clone())
        );
        assert_eq!(orchestrator.sessions().session(), Some(session.clone()));
        assert_eq!(
            events.recv().await.unwrap(),
            crate::auth::SessionEvent::SignedIn(session)
        );
        assert_eq!(verifier.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejection_skips_verifier() {
        let verifier = Arc::new(LocalVerifier::new(DOMAIN));
        let orchestrator = orchestrator(verifier.clone(), OrchestratorConfig::default());
        let wallet = Arc::new(MockWallet::new(
            KeypairWallet::generate().address().clone(),
            vec![0; 64],
        ));
        wallet.set_reply(MockReply::Reject);
        let account = wallet.primary_account().unwrap();

        let err = orchestrator.sign_in(wallet.clone(), &account).await.unwrap_err();

        assert_eq!(err.kind(), SignInErrorKind::UserRejected);
        assert_eq!(verifier.verify_calls(), 0);
        assert_eq!(
            orchestrator.state(&account.address),
            SignInState::Failed(SignInErrorKind::UserRejected)
        );
        assert!(orchestrator.sessions().session().is_none());
    }

    #[tokio::test]
    async fn test_missing_capability_is_rejection() {
        let verifier = Arc::new(LocalVerifier::new(DOMAIN));
        let orchestrator = orchestrator(verifier.clone(), OrchestratorConfig::default());
        let wallet = Arc::new(
            MockWallet::new(KeypairWallet::generate().address().clone(), vec![0; 64])
                .with_capabilities(WalletCapabilities::default()),
        );
        let account = wallet.primary_account().unwrap();

        let err = orchestrator.sign_in(wallet.clone(), &account).await.unwrap_err();
        assert_eq!(err.kind(), SignInErrorKind::UserRejected);
        assert_eq!(wallet.sign_calls(), 0);
        assert_eq!(verifier.verify_calls(), 0);
    }

    #[tokio::test]
    async fn test_retry_uses_fresh_nonce() {
        let verifier = Arc::new(LocalVerifier::new(DOMAIN));
        let orchestrator = orchestrator(verifier, OrchestratorConfig::default());
        let wallet = Arc::new(MockWallet::new(
            KeypairWallet::generate().address().clone(),
            vec![0; 64],
        ));
        let account = wallet.primary_account().unwrap();

        wallet.set_reply(MockReply::Reject);
        assert!(orchestrator.sign_in(wallet.clone(), &account).await.is_err());
        wallet.set_reply(MockReply::Sign(vec![1; 64]));
        // Bogus signature: verifier rejects, but a fresh challenge was still issued.
        let err = orchestrator.sign_in(wallet.clone(), &account).await.unwrap_err();
        assert_eq!(err.kind(), SignInErrorKind::VerificationError);

        let messages = wallet.signed_messages();
        assert_eq!(messages.len(), 2);
        assert_ne!(nonce_of(&messages[0]), nonce_of(&messages[1]));
    }

    #[tokio::test]
    async fn test_abandon_all_drops_unwatched_flows() {
        let verifier = Arc::new(LocalVerifier::new(DOMAIN));
        let orchestrator = orchestrator(verifier, OrchestratorConfig::default());
        let watched = Arc::new(KeypairWallet::generate());
        let unwatched = Arc::new(KeypairWallet::generate());
        let watched_account = watched.primary_account().unwrap();
        let unwatched_account = unwatched.primary_account().unwrap();
        let mut states = orchestrator.subscribe(&watched_account.address);

        orchestrator.sign_in(watched.clone(), &watched_account).await.unwrap();
        orchestrator.sign_in(unwatched.clone(), &unwatched_account).await.unwrap();
        assert_eq!(orchestrator.inner.flows.lock().unwrap().len(), 2);

        orchestrator.abandon_all();

        let flows = orchestrator.inner.flows.lock().unwrap();
        assert_eq!(flows.len(), 1);
        assert!(flows.contains_key(&watched_account.address));
        drop(flows);
        assert_eq!(*states.borrow_and_update(), SignInState::Idle);
        assert_eq!(orchestrator.state(&unwatched_account.address), SignInState::Idle);
    }

    #[tokio::test]
    async fn test_stale_attempt_ignored_after_flow_is_dropped() {
        let verifier = Arc::new(LocalVerifier::new(DOMAIN));
        let orchestrator = orchestrator(verifier, OrchestratorConfig::default());
        let wallet = Arc::new(
            MockWallet::new(KeypairWallet::generate().address().clone(), vec![0; 64])
                .with_delay(Duration::from_millis(100)),
        );
        let account = wallet.primary_account().unwrap();

        let first = {
            let orchestrator = orchestrator.clone();
            let wallet = wallet.clone();
            let account = account.clone();
            tokio::spawn(async move { orchestrator.sign_in(wallet, &account).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        orchestrator.abandon_all();
        assert!(orchestrator.inner.flows.lock().unwrap().is_empty());

        let second = orchestrator.sign_in(wallet.clone(), &account);
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap(), Err(SignInError::Cancelled));
        // Bogus signature: the second attempt reaches the verifier and fails there.
        assert_eq!(
            second.unwrap_err().kind(),
            SignInErrorKind::VerificationError
        );
        assert_eq!(
            orchestrator.state(&account.address),
            SignInState::Failed(SignInErrorKind::VerificationError)
        );
    }

    #[tokio::test]
    async fn test_wallet_timeout_is_transport_error() {
        let verifier = Arc::new(LocalVerifier::new(DOMAIN));
        let orchestrator = orchestrator(
            verifier.clone(),
            OrchestratorConfig {
                ui_timeout: Duration::from_millis(50),
            },
        );
        let wallet = Arc::new(
            MockWallet::new(KeypairWallet::generate().address().clone(), vec![0; 64])
                .with_delay(Duration::from_secs(5)),
        );
        let account = wallet.primary_account().unwrap();

        let err = orchestrator.sign_in(wallet.clone(), &account).await.unwrap_err();
        assert!(matches!(err, SignInError::Timeout { .. }));
        assert_eq!(
            orchestrator.state(&account.address),
            SignInState::Failed(SignInErrorKind::TransportError)
        );
        assert_eq!(verifier.verify_calls(), 0);
    }
}
