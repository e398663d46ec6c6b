/*
[INPUT]:  Connected wallet accounts and payloads to sign
[OUTPUT]: Signatures, or typed refusals for missing capabilities
[POS]:    Auth layer - wallet integration abstraction
[UPDATE]: When adding wallet capabilities or new wallet kinds
*/

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::error::{WalletError, WalletFeature};
use crate::types::WalletAddress;

/// Fixed capability set a wallet declares up front
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalletCapabilities {
    pub can_sign_message: bool,
    pub can_sign_transaction: bool,
    pub can_send_transaction: bool,
}

impl WalletCapabilities {
    pub fn all() -> Self {
        Self {
            can_sign_message: true,
            can_sign_transaction: true,
            can_send_transaction: true,
        }
    }

    pub fn supports(&self, feature: WalletFeature) -> bool {
        match feature {
            WalletFeature::SignMessage => self.can_sign_message,
            WalletFeature::SignTransaction => self.can_sign_transaction,
            WalletFeature::SendTransaction => self.can_send_transaction,
        }
    }

    /// Fail with `Unsupported` unless the feature is declared
    pub fn require(&self, feature: WalletFeature) -> Result<(), WalletError> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(WalletError::Unsupported(feature))
        }
    }
}

/// Account exposed by a connected wallet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletAccount {
    pub address: WalletAddress,
    pub label: Option<String>,
}

impl WalletAccount {
    pub fn new(address: WalletAddress) -> Self {
        Self {
            address,
            label: None,
        }
    }
}

/// Trait for wallet signing operations
///
/// Callers check [`Wallet::capabilities`] before invoking a feature; the
/// default method bodies report `Unsupported`.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Display name of the wallet
    fn name(&self) -> &str;

    /// Connected accounts, empty when disconnected
    fn accounts(&self) -> Vec<WalletAccount>;

    fn capabilities(&self) -> WalletCapabilities;

    /// Sign arbitrary bytes and return the raw 64-byte signature
    async fn sign_message(
        &self,
        account: &WalletAccount,
        message: &[u8],
    ) -> Result<Vec<u8>, WalletError>;

    /// Sign a serialized transaction message and return the signature
    async fn sign_transaction(
        &self,
        account: &WalletAccount,
        transaction: &[u8],
    ) -> Result<Vec<u8>, WalletError> {
        let _ = (account, transaction);
        Err(WalletError::Unsupported(WalletFeature::SignTransaction))
    }

    fn is_connected(&self) -> bool {
        !self.accounts().is_empty()
    }

    /// First connected account, if any
    fn primary_account(&self) -> Option<WalletAccount> {
        self.accounts().into_iter().next()
    }
}

/// Scripted reply of a [`MockWallet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Sign(Vec<u8>),
    Reject,
    Fail(String),
}

/// Mock wallet for testing
#[derive(Debug)]
pub struct MockWallet {
    name: String,
    accounts: Vec<WalletAccount>,
    capabilities: WalletCapabilities,
    reply: Mutex<MockReply>,
    delay: Option<Duration>,
    sign_calls: AtomicUsize,
    messages: Mutex<Vec<Vec<u8>>>,
}

impl MockWallet {
    /// Create a mock that answers every signing request with `signature`
    pub fn new(account: WalletAddress, signature: Vec<u8>) -> Self {
        Self {
            name: "Mock Wallet".to_string(),
            accounts: vec![WalletAccount::new(account)],
            capabilities: WalletCapabilities::all(),
            reply: Mutex::new(MockReply::Sign(signature)),
            delay: None,
            sign_calls: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn with_capabilities(mut self, capabilities: WalletCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Delay every signing response, e.g. to keep an attempt in flight
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_reply(&self, reply: MockReply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    /// Every payload passed to `sign_message`, in order
    pub fn signed_messages(&self) -> Vec<Vec<u8>> {
        self.messages.lock().unwrap().clone()
    }

    async fn reply(&self, account: &WalletAccount) -> Result<Vec<u8>, WalletError> {
        if !self.accounts.contains(account) {
            return Err(WalletError::UnknownAccount(account.address.to_string()));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            MockReply::Sign(signature) => Ok(signature),
            MockReply::Reject => Err(WalletError::Rejected("user declined".to_string())),
            MockReply::Fail(message) => Err(WalletError::Transport(message)),
        }
    }
}

#[async_trait]
impl Wallet for MockWallet {
    fn name(&self) -> &str {
        &self.name
    }

    fn accounts(&self) -> Vec<WalletAccount> {
        self.accounts.clone()
    }

    fn capabilities(&self) -> WalletCapabilities {
        self.capabilities
    }

    async fn sign_message(
        &self,
        account: &WalletAccount,
        message: &[u8],
    ) -> Result<Vec<u8>, WalletError> {
        self.capabilities.require(WalletFeature::SignMessage)?;
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.messages.lock().unwrap().push(message.to_vec());
        self.reply(account).await
    }

    async fn sign_transaction(
        &self,
        account: &WalletAccount,
        _transaction: &[u8],
    ) -> Result<Vec<u8>, WalletError> {
        self.capabilities.require(WalletFeature::SignTransaction)?;
        self.reply(account).await
    }
}
