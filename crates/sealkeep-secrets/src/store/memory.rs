//! In-process secret store.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use zeroize::Zeroizing;

use super::SecretStore;
use crate::error::Result;
use crate::sensitive::{ByteSecret, SensitiveValue};

/// Secret store that keeps blobs in memory.
///
/// Clones share the same contents and availability flag, so a handle kept
/// by the caller observes what a [`SecureStorage`](crate::SecureStorage)
/// wrote through another handle.
#[derive(Clone)]
pub struct MemorySecretStore {
    name: String,
    available: Arc<AtomicBool>,
    secrets: Arc<Mutex<HashMap<String, Zeroizing<Vec<u8>>>>>,
}

impl MemorySecretStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: Arc::new(AtomicBool::new(true)),
            secrets: Arc::default(),
        }
    }

    /// Change what [`SecretStore::is_available`] reports.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Builder form of [`set_available`](Self::set_available).
    pub fn with_available(self, available: bool) -> Self {
        self.set_available(available);
        self
    }

    /// Number of stored secrets.
    pub fn len(&self) -> usize {
        self.secrets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.lock().is_empty()
    }
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl fmt::Debug for MemorySecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySecretStore")
            .field("name", &self.name)
            .field("available", &self.available.load(Ordering::SeqCst))
            .field("secrets", &self.len())
            .finish()
    }
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> Result<bool> {
        Ok(self.available.load(Ordering::SeqCst))
    }

    fn has_secret(&self, id: &str) -> Result<bool> {
        Ok(self.secrets.lock().contains_key(id))
    }

    fn get_secret(&self, id: &str) -> Result<Option<ByteSecret>> {
        Ok(self
            .secrets
            .lock()
            .get(id)
            .map(|blob| SensitiveValue::wrap(blob.to_vec())))
    }

    fn set_secret(&self, id: &str, secret: &[u8]) -> Result<()> {
        self.secrets
            .lock()
            .insert(id.to_string(), Zeroizing::new(secret.to_vec()));
        Ok(())
    }

    fn delete_secret(&self, id: &str) -> Result<()> {
        self.secrets.lock().remove(id);
        Ok(())
    }
}
