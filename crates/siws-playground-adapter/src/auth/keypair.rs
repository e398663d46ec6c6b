/*
[INPUT]:  Solana private key (base58) and payloads to sign
[OUTPUT]: Ed25519 signatures from a locally held keypair
[POS]:    Auth layer - local keypair wallet and signature verification helper
[UPDATE]: When keypair formats or the Solana SDK version change
*/

use async_trait::async_trait;
use ed25519_dalek::{Signature, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use solana_keypair::Keypair;
use solana_signer::Signer;

use super::error::{WalletError, WalletFeature};
use super::wallet::{Wallet, WalletAccount, WalletCapabilities};
use crate::http::{PlaygroundError, Result};
use crate::types::WalletAddress;

/// Wallet backed by a keypair held in memory
#[derive(Debug)]
pub struct KeypairWallet {
    name: String,
    keypair: Keypair,
    account: WalletAccount,
}

impl KeypairWallet {
    /// Generate a fresh random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(&signing_key)
    }

    /// Create a wallet from a base58-encoded private key
    /// Supports 64-byte keypair or 32-byte seed
    pub fn from_base58(private_key_base58: &str) -> Result<Self> {
        let bytes = bs58::decode(private_key_base58.trim())
            .into_vec()
            .map_err(|e| PlaygroundError::Config(format!("Invalid base58 private key: {e}")))?;

        match bytes.len() {
            64 => {
                let keypair = Keypair::try_from(bytes.as_slice())
                    .map_err(|e| PlaygroundError::Config(format!("Invalid keypair bytes: {e}")))?;
                Ok(Self::from_keypair(keypair))
            }
            32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(&bytes);
                Ok(Self::from_signing_key(&SigningKey::from_bytes(&seed)))
            }
            other => Err(PlaygroundError::Config(format!(
                "Invalid private key length: expected 32 or 64 bytes, got {other}"
            ))),
        }
    }

    fn from_signing_key(signing_key: &SigningKey) -> Self {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&signing_key.to_bytes());
        bytes[32..].copy_from_slice(signing_key.verifying_key().as_bytes());
        // Secret and public halves come from the same key, so this cannot fail.
        let keypair = Keypair::try_from(bytes.as_slice())
            .unwrap_or_else(|e| panic!("keypair from signing key: {e}"));
        Self::from_keypair(keypair)
    }

    fn from_keypair(keypair: Keypair) -> Self {
        let address = WalletAddress::from_public_key(&keypair.pubkey().to_bytes());
        Self {
            name: "Local Keypair".to_string(),
            keypair,
            account: WalletAccount::new(address),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn address(&self) -> &WalletAddress {
        &self.account.address
    }

    /// 64-byte keypair in base58, the format accepted by `from_base58`
    pub fn to_base58(&self) -> String {
        bs58::encode(self.keypair.to_bytes()).into_string()
    }

    fn sign_bytes(&self, account: &WalletAccount, payload: &[u8]) -> std::result::Result<Vec<u8>, WalletError> {
        if account.address != self.account.address {
            return Err(WalletError::UnknownAccount(account.address.to_string()));
        }
        let signature = self.keypair.sign_message(payload);
        Ok(signature.as_ref().to_vec())
    }
}

#[async_trait]
impl Wallet for KeypairWallet {
    fn name(&self) -> &str {
        &self.name
    }

    fn accounts(&self) -> Vec<WalletAccount> {
        vec![self.account.clone()]
    }

    fn capabilities(&self) -> WalletCapabilities {
        WalletCapabilities::all()
    }

    async fn sign_message(
        &self,
        account: &WalletAccount,
        message: &[u8],
    ) -> std::result::Result<Vec<u8>, WalletError> {
        self.sign_bytes(account, message)
    }

    async fn sign_transaction(
        &self,
        account: &WalletAccount,
        transaction: &[u8],
    ) -> std::result::Result<Vec<u8>, WalletError> {
        self.capabilities().require(WalletFeature::SignTransaction)?;
        self.sign_bytes(account, transaction)
    }
}

/// Verify an ed25519 signature over `message` by `public_key`
pub fn verify_signature(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(key_bytes) = <[u8; 32]>::try_from(public_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keypair_wallet_from_seed() {
        // A dummy 32-byte seed in base58 (all zeros)
        let seed = "11111111111111111111111111111111";
        let wallet = KeypairWallet::from_base58(seed).unwrap();
        let account = wallet.primary_account().unwrap();

        let signature = wallet.sign_message(&account, b"hello world").await.unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify_signature(
            &wallet.address().to_bytes(),
            b"hello world",
            &signature
        ));
        assert!(!verify_signature(
            &wallet.address().to_bytes(),
            b"other",
            &signature
        ));
    }

    #[test]
    fn test_base58_keypair_roundtrip() {
        let wallet = KeypairWallet::generate();
        let restored = KeypairWallet::from_base58(&wallet.to_base58()).unwrap();
        assert_eq!(restored.address(), wallet.address());
    }

    #[test]
    fn test_keypair_wallet_invalid_key() {
        assert!(KeypairWallet::from_base58("invalid_base58_!@#").is_err());
        assert!(KeypairWallet::from_base58("bs58tooShort").is_err());
    }

    #[tokio::test]
    async fn test_rejects_foreign_account() {
        let wallet = KeypairWallet::generate();
        let stranger = WalletAccount::new(KeypairWallet::generate().address().clone());
        let err = wallet.sign_message(&stranger, b"hi").await.unwrap_err();
        assert!(matches!(err, WalletError::UnknownAccount(_)));
    }

    #[test]
    fn test_verify_signature_malformed_inputs() {
        assert!(!verify_signature(&[1, 2, 3], b"m", &[0; 64]));
        assert!(!verify_signature(&[0; 32], b"m", &[0; 10]));
    }
}
