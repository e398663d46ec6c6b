/*
[INPUT]:  Wallet addresses, RPC balances, verifier responses
[OUTPUT]: Validated domain models (addresses, lamports, challenges, sessions)
[POS]:    Data layer - core records exchanged across the sign-in flow
[UPDATE]: When the challenge layout or session shape changes
*/

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::http::{PlaygroundError, Result};

/// Number of decimal places between lamports and SOL
pub const SOL_DECIMALS: u32 = 9;

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Base58-encoded Solana public key, validated to decode to 32 bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse a base58 address; surrounding whitespace is ignored
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PlaygroundError::InvalidAddress(
                "address is empty".to_string(),
            ));
        }

        let bytes = bs58::decode(trimmed).into_vec().map_err(|e| {
            PlaygroundError::InvalidAddress(format!("{trimmed} is not base58: {e}"))
        })?;
        if bytes.len() != 32 {
            return Err(PlaygroundError::InvalidAddress(format!(
                "{trimmed} decodes to {} bytes, expected 32",
                bytes.len()
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Build an address from raw public key bytes
    pub fn from_public_key(bytes: &[u8; 32]) -> Self {
        Self(bs58::encode(bytes).into_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw public key bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        // Length was checked in `parse`/`from_public_key`.
        if let Ok(bytes) = bs58::decode(&self.0).into_vec() {
            out.copy_from_slice(&bytes);
        }
        out
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = PlaygroundError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

/// Balance in lamports, the smallest SOL unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lamports(pub u64);

impl Lamports {
    /// Amount in SOL, always carrying nine fractional digits
    pub fn to_sol(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.0 as i128, SOL_DECIMALS)
    }
}

impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SOL", self.to_sol())
    }
}

/// Sign-In-With-Solana challenge presented to the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInChallenge {
    pub domain: String,
    pub address: WalletAddress,
    pub statement: String,
    pub uri: String,
    pub version: String,
    pub chain_id: String,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<DateTime<Utc>>,
}

impl SignInChallenge {
    /// True once the expiration time has passed
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time.is_some_and(|expires| now >= expires)
    }
}

/// Challenge together with the wallet's signature over its canonical message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub challenge: SignInChallenge,
    pub signature: Vec<u8>,
    pub signer_public_key: Vec<u8>,
}

impl SignedMessage {
    /// Signer key matches the address the challenge was issued for
    pub fn signer_matches_address(&self) -> bool {
        self.signer_public_key.as_slice() == self.challenge.address.to_bytes().as_slice()
    }
}

/// Authenticated session issued by the backend verifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub wallet_address: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
