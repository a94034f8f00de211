//! Windows Credential Manager secret store.
//!
//! Each master secret is a generic credential with target
//! `<namespace>.<id>` owned by the current OS user. On other platforms the
//! store reports itself unavailable.

use sealkeep_core::env;
use tracing::debug;

use super::{service_name, validate_id, SecretStore};
use crate::error::Result;
use crate::sensitive::{ByteSecret, SensitiveValue};

/// Secret store backed by the Windows Credential Manager.
#[derive(Debug, Clone)]
pub struct CredentialManagerSecretStore {
    namespace: String,
    user: String,
    enabled: bool,
}

impl CredentialManagerSecretStore {
    /// Create a store filing credentials under `namespace` for the current user.
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            user: env::current_user(),
            enabled: true,
        }
    }

    /// Enable or disable the backend.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn target(&self, id: &str) -> Result<String> {
        validate_id(id)?;
        Ok(service_name(&self.namespace, id))
    }
}

impl SecretStore for CredentialManagerSecretStore {
    fn name(&self) -> &str {
        "credential-manager"
    }

    fn is_available(&self) -> Result<bool> {
        Ok(self.enabled && cfg!(windows))
    }

    fn has_secret(&self, id: &str) -> Result<bool> {
        Ok(self.get_secret(id)?.is_some())
    }

    fn get_secret(&self, id: &str) -> Result<Option<ByteSecret>> {
        let target = self.target(id)?;
        let found = platform::get(&target, &self.user)?;
        if found.is_some() {
            debug!(target, "found credential");
        }
        Ok(found.map(SensitiveValue::wrap))
    }

    fn set_secret(&self, id: &str, secret: &[u8]) -> Result<()> {
        let target = self.target(id)?;
        debug!(target, "writing credential");
        platform::set(&target, &self.user, secret)
    }

    fn delete_secret(&self, id: &str) -> Result<()> {
        let target = self.target(id)?;
        debug!(target, "deleting credential");
        platform::delete(&target, &self.user)
    }
}

#[cfg(windows)]
mod platform {
    use keyring::Entry;

    use crate::error::{Result, SecretError};

    fn entry(target: &str, user: &str) -> Result<Entry> {
        Entry::new_with_target(target, target, user)
            .map_err(|e| SecretError::CredentialManager(e.to_string()))
    }

    pub(super) fn get(target: &str, user: &str) -> Result<Option<Vec<u8>>> {
        match entry(target, user)?.get_secret() {
            Ok(data) => Ok(Some(data)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SecretError::CredentialManager(format!(
                "credential read failed: {e}"
            ))),
        }
    }

    pub(super) fn set(target: &str, user: &str, secret: &[u8]) -> Result<()> {
        entry(target, user)?
            .set_secret(secret)
            .map_err(|e| SecretError::CredentialManager(format!("credential write failed: {e}")))
    }

    pub(super) fn delete(target: &str, user: &str) -> Result<()> {
        match entry(target, user)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretError::CredentialManager(format!(
                "credential delete failed: {e}"
            ))),
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use crate::error::{Result, SecretError};

    fn unsupported() -> SecretError {
        SecretError::CredentialManager(
            "Credential Manager is not available on this platform".to_string(),
        )
    }

    pub(super) fn get(_target: &str, _user: &str) -> Result<Option<Vec<u8>>> {
        Err(unsupported())
    }

    pub(super) fn set(_target: &str, _user: &str, _secret: &[u8]) -> Result<()> {
        Err(unsupported())
    }

    pub(super) fn delete(_target: &str, _user: &str) -> Result<()> {
        Err(unsupported())
    }
}
