/*
[INPUT]:  Wallet name and key storage directory
[OUTPUT]: Persistent local keypair wallets
[POS]:    Auth layer - on-disk storage for development keypairs
[UPDATE]: When key storage format or file naming conventions change
*/

use std::fs;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::keypair::KeypairWallet;

const KEY_SUFFIX: &str = ".key";

/// Manages persistence of local keypair wallets
#[derive(Debug, Clone)]
pub struct KeyStore {
    key_dir: PathBuf,
}

impl KeyStore {
    /// Create a key store rooted at the given directory
    pub fn new(key_dir: impl AsRef<Path>) -> Self {
        Self {
            key_dir: key_dir.as_ref().to_path_buf(),
        }
    }

    pub fn key_dir(&self) -> &Path {
        &self.key_dir
    }

    /// Load the named wallet or create and save a new one
    pub fn get_or_create(&self, name: &str) -> io::Result<KeypairWallet> {
        if let Some(wallet) = self.load(name) {
            return Ok(wallet);
        }
        let wallet = KeypairWallet::generate().with_name(name);
        self.save(name, &wallet)?;
        info!(name, address = %wallet.address(), "created local keypair");
        Ok(wallet)
    }

    /// Load a wallet from disk; unreadable or corrupt files yield `None`
    pub fn load(&self, name: &str) -> Option<KeypairWallet> {
        let path = self.key_file_path(name);
        let content = fs::read_to_string(&path).ok()?;
        match KeypairWallet::from_base58(content.trim()) {
            Ok(wallet) => Some(wallet.with_name(name)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring corrupt key file");
                None
            }
        }
    }

    /// Save a wallet's keypair, readable by the owner only
    pub fn save(&self, name: &str, wallet: &KeypairWallet) -> io::Result<()> {
        validate_name(name)?;
        if !self.key_dir.exists() {
            fs::create_dir_all(&self.key_dir)?;
        }

        let path = self.key_file_path(name);
        fs::write(&path, wallet.to_base58())?;

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Names of all stored wallets, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = fs::read_dir(&self.key_dir) {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Some(stem) = name.strip_suffix(KEY_SUFFIX) {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        names.sort();
        names
    }

    pub fn key_file_path(&self, name: &str) -> PathBuf {
        self.key_dir.join(format!("{name}{KEY_SUFFIX}"))
    }
}

fn validate_name(name: &str) -> io::Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid wallet name {name:?}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let mut path = env::temp_dir();
        path.push(format!("siws-test-{}", Uuid::new_v4()));
        fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn test_key_store_lifecycle() {
        let dir = temp_dir();
        let store = KeyStore::new(&dir);

        let first = store.get_or_create("dev").unwrap();
        let loaded = store.load("dev").expect("Should load existing key");
        assert_eq!(loaded.address(), first.address());

        let again = store.get_or_create("dev").unwrap();
        assert_eq!(again.address(), first.address());
        assert_eq!(store.list(), vec!["dev".to_string()]);

        #[cfg(unix)]
        {
            let metadata = fs::metadata(store.key_file_path("dev")).unwrap();
            assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
        }

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_multi_wallet_isolation() {
        let dir = temp_dir();
        let store = KeyStore::new(&dir);

        let a = store.get_or_create("alice").unwrap();
        let b = store.get_or_create("bob").unwrap();
        assert_ne!(a.address(), b.address());
        assert_eq!(store.list(), vec!["alice".to_string(), "bob".to_string()]);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_rejects_path_like_names() {
        let dir = temp_dir();
        let store = KeyStore::new(&dir);
        assert!(store.get_or_create("../escape").is_err());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_corrupt_file_ignored() {
        let dir = temp_dir();
        let store = KeyStore::new(&dir);
        fs::write(store.key_file_path("broken"), "not-a-key").unwrap();
        assert!(store.load("broken").is_none());
        fs::remove_dir_all(dir).unwrap();
    }
}
