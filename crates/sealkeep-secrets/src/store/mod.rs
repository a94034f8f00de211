//! Secret storage backends.
//!
//! Defines the [`SecretStore`] trait that every master-secret backend
//! implements, plus the concrete backends and the default priority list
//! built from [`Config`].

mod credential_manager;
mod file;
mod keychain;
mod memory;

pub use credential_manager::CredentialManagerSecretStore;
pub use file::FileSecretStore;
pub use keychain::KeychainSecretStore;
pub use memory::MemorySecretStore;

use sealkeep_core::Config;

use crate::error::{Result, SecretError};
use crate::sensitive::ByteSecret;

/// Maximum allowed length for a secret id.
const MAX_ID_LEN: usize = 128;

/// Synchronous backend holding one opaque master secret blob per id.
///
/// Backends never interpret the blob. Every call blocks the caller for as
/// long as the underlying vault or file system takes.
pub trait SecretStore: Send + Sync {
    /// Short human-readable backend name.
    fn name(&self) -> &str;

    /// Whether the backend can be used in this process.
    fn is_available(&self) -> Result<bool>;

    /// Whether a secret is stored for `id`.
    fn has_secret(&self, id: &str) -> Result<bool>;

    /// Fetch the secret stored for `id`, if any.
    fn get_secret(&self, id: &str) -> Result<Option<ByteSecret>>;

    /// Store `secret` for `id`, replacing any previous value.
    fn set_secret(&self, id: &str, secret: &[u8]) -> Result<()>;

    /// Remove the secret stored for `id`. Removing a missing secret succeeds.
    fn delete_secret(&self, id: &str) -> Result<()>;
}

impl<S: SecretStore + ?Sized> SecretStore for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_available(&self) -> Result<bool> {
        (**self).is_available()
    }

    fn has_secret(&self, id: &str) -> Result<bool> {
        (**self).has_secret(id)
    }

    fn get_secret(&self, id: &str) -> Result<Option<ByteSecret>> {
        (**self).get_secret(id)
    }

    fn set_secret(&self, id: &str, secret: &[u8]) -> Result<()> {
        (**self).set_secret(id, secret)
    }

    fn delete_secret(&self, id: &str) -> Result<()> {
        (**self).delete_secret(id)
    }
}

/// Validate that a secret id is safe to use as a file name and vault key.
///
/// Allowed: ASCII alphanumeric, underscore, hyphen, and dots that neither
/// lead the id nor repeat. Max length 128.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(SecretError::InvalidId("id must not be empty".to_string()));
    }
    if id.len() > MAX_ID_LEN {
        return Err(SecretError::InvalidId(format!(
            "id exceeds maximum length of {MAX_ID_LEN} characters"
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(SecretError::InvalidId(format!(
            "id contains invalid characters (allowed: alphanumeric, underscore, hyphen, dot): {id}"
        )));
    }
    if id.starts_with('.') || id.contains("..") {
        return Err(SecretError::InvalidId(format!(
            "id must not start with a dot or contain '..': {id}"
        )));
    }
    Ok(())
}

/// Build the backends enabled by `config`, highest priority first.
///
/// Platform backends are always listed so that callers can report on them;
/// they simply report themselves unavailable off their platform.
pub fn default_stores(config: &Config) -> Result<Vec<Box<dyn SecretStore>>> {
    let storage = &config.storage;
    let stores: Vec<Box<dyn SecretStore>> = vec![
        Box::new(KeychainSecretStore::new(&storage.namespace).enabled(storage.keychain)),
        Box::new(
            CredentialManagerSecretStore::new(&storage.namespace)
                .enabled(storage.credential_manager),
        ),
        Box::new(FileSecretStore::new(config.secrets_dir()?).enabled(storage.file)),
    ];
    Ok(stores)
}

/// Vault service name for `id` under `namespace`.
fn service_name(namespace: &str, id: &str) -> String {
    format!("{namespace}.{id}")
}
