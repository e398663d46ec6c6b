/*
[INPUT]:  Signed sign-in challenges
[OUTPUT]: Sessions, or verification/transport errors
[POS]:    Auth layer - backend verifier contract and its implementations
[UPDATE]: When the verify endpoint or acceptance rules change
*/

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::challenge::default_challenge_ttl;
use super::error::{SignInError, VerificationError};
use super::keypair::verify_signature;
use crate::http::{PlaygroundClient, PlaygroundError};
use crate::types::{Session, SignInChallenge, SignedMessage};

/// Default path of the verification endpoint on the auth backend
pub const VERIFY_ENDPOINT: &str = "api/auth/siws/verify";

/// Authority that turns a signed challenge into a session.
///
/// Implementations own replay prevention: a nonce must be accepted at most once.
#[async_trait]
pub trait BackendVerifier: Send + Sync {
    async fn verify(&self, signed: &SignedMessage) -> Result<Session, SignInError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    message: String,
    signature: String,
    public_key: String,
    challenge: &'a SignInChallenge,
}

/// Verifier that forwards to the auth backend over HTTP
#[derive(Debug, Clone)]
pub struct HttpVerifier {
    client: PlaygroundClient,
    endpoint: String,
}

impl HttpVerifier {
    pub fn new(client: PlaygroundClient) -> Self {
        Self {
            client,
            endpoint: VERIFY_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl BackendVerifier for HttpVerifier {
    /// POST {auth_base_url}api/auth/siws/verify
    async fn verify(&self, signed: &SignedMessage) -> Result<Session, SignInError> {
        let body = VerifyRequest {
            message: signed.challenge.to_message(),
            signature: bs58::encode(&signed.signature).into_string(),
            public_key: bs58::encode(&signed.signer_public_key).into_string(),
            challenge: &signed.challenge,
        };

        let builder = self
            .client
            .auth_request(Method::POST, &self.endpoint)?
            .json(&body);

        match self.client.send_json::<Session>(builder).await {
            Ok(session) => {
                info!(wallet = %session.wallet_address, "backend accepted sign-in");
                Ok(session)
            }
            Err(PlaygroundError::Api {
                code,
                message,
                reason,
            }) if (400..500).contains(&code) => {
                warn!(status = code, reason = ?reason, message = %message, "backend rejected sign-in");
                let reason = reason.unwrap_or_default();
                Err(VerificationError::from_code(&reason, message).into())
            }
            Err(err) => Err(SignInError::from(err)),
        }
    }
}

#[derive(Debug, Default)]
struct LocalState {
    /// Consumed nonce -> time after which it can be forgotten
    used_nonces: HashMap<String, DateTime<Utc>>,
    /// Wallet address -> stable user id
    users: HashMap<String, String>,
}

/// In-process verifier for local development and tests
#[derive(Debug)]
pub struct LocalVerifier {
    domain: String,
    session_ttl: Duration,
    state: Mutex<LocalState>,
    verify_calls: AtomicUsize,
}

impl LocalVerifier {
    /// Accept challenges issued for `domain`
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            session_ttl: Duration::days(7),
            state: Mutex::new(LocalState::default()),
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Number of `verify` calls received
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// Check a signed challenge as of `now`
    pub fn verify_at(
        &self,
        signed: &SignedMessage,
        now: DateTime<Utc>,
    ) -> Result<Session, VerificationError> {
        let challenge = &signed.challenge;

        if !signed.signer_matches_address() {
            return Err(VerificationError::AddressMismatch);
        }
        if challenge.domain != self.domain {
            return Err(VerificationError::DomainMismatch);
        }
        if challenge.is_expired_at(now) {
            return Err(VerificationError::Expired);
        }
        if !verify_signature(
            &signed.signer_public_key,
            &challenge.message_bytes(),
            &signed.signature,
        ) {
            return Err(VerificationError::InvalidSignature);
        }

        let mut state = self.state.lock().unwrap();
        state.used_nonces.retain(|_, forget_after| *forget_after > now);
        if state.used_nonces.contains_key(&challenge.nonce) {
            return Err(VerificationError::NonceReused);
        }
        let forget_after = challenge
            .expiration_time
            .unwrap_or(challenge.issued_at + default_challenge_ttl());
        state
            .used_nonces
            .insert(challenge.nonce.clone(), forget_after);

        let address = challenge.address.to_string();
        let user_id = state
            .users
            .entry(address.clone())
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone();

        let mut token = [0u8; 32];
        OsRng.fill_bytes(&mut token);

        Ok(Session {
            user_id,
            wallet_address: address,
            issued_at: now,
            expires_at: now + self.session_ttl,
            token: Some(hex::encode(token)),
        })
    }
}

#[async_trait]
impl BackendVerifier for LocalVerifier {
    async fn verify(&self, signed: &SignedMessage) -> Result<Session, SignInError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        match self.verify_at(signed, Utc::now()) {
            Ok(session) => {
                debug!(wallet = %session.wallet_address, "local verifier accepted sign-in");
                Ok(session)
            }
            Err(err) => {
                debug!(error = %err, "local verifier rejected sign-in");
                Err(err.into())
            }
        }
    }
}
