//! In-memory key store.
//!
//! Keys live only as long as the store; nothing is written to disk.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use muse_crypto::{PrivateKey, PublicKey};
use muse_tx::KeyStore;

use crate::WalletError;

#[derive(Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<PublicKey, PrivateKey>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `key`, returning its public key.
    pub fn add_key(&self, key: PrivateKey) -> PublicKey {
        let public = key.public_key();
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(public, key);
        public
    }

    pub fn add_wif(&self, wif: &str) -> Result<PublicKey, WalletError> {
        let key = PrivateKey::from_wif(wif)?;
        Ok(self.add_key(key))
    }

    pub fn remove(&self, public: &PublicKey) -> bool {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(public)
            .is_some()
    }

    pub fn contains(&self, public: &PublicKey) -> bool {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(public)
    }

    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyStore for MemoryKeyStore {
    fn lookup_private_key(&self, key: &PublicKey) -> Option<PrivateKey> {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn list_public_keys(&self) -> Vec<PublicKey> {
        let mut keys: Vec<PublicKey> = self
            .keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        keys.sort();
        keys
    }
}
