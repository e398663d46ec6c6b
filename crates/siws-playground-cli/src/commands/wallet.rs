/*
[INPUT]:  Key directory, wallet names, base58 private keys
[OUTPUT]: Local keypair wallets
[POS]:    CLI command layer - wallet selection and key management
[UPDATE]: When wallet selection rules change
*/

use std::path::Path;

use anyhow::{Context, Result};
use siws_playground_adapter::{KeyStore, KeypairWallet};

/// Pick the wallet for a command: an explicit key wins over a stored one
pub fn resolve(key_dir: &Path, name: &str, keypair: Option<&str>) -> Result<KeypairWallet> {
    match keypair {
        Some(secret) => KeypairWallet::from_base58(secret.trim()).context("parse --keypair"),
        None => KeyStore::new(key_dir)
            .get_or_create(name)
            .with_context(|| format!("load wallet {name:?} from {}", key_dir.display())),
    }
}

pub fn create(key_dir: &Path, name: &str) -> Result<KeypairWallet> {
    KeyStore::new(key_dir)
        .get_or_create(name)
        .with_context(|| format!("create wallet {name:?}"))
}

/// One `name: address` line per stored wallet
pub fn list(key_dir: &Path) -> Vec<String> {
    let store = KeyStore::new(key_dir);
    store
        .list()
        .into_iter()
        .filter_map(|name| {
            let wallet = store.load(&name)?;
            Some(format!("{name}: {}", wallet.address()))
        })
        .collect()
}
