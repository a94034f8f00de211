//! macOS Keychain secret store.
//!
//! Each master secret is a generic password item whose service is
//! `<namespace>.<id>` and whose account is the current OS user. On other
//! platforms the store reports itself unavailable.

use sealkeep_core::env;
use tracing::debug;

use super::{service_name, validate_id, SecretStore};
use crate::error::Result;
use crate::sensitive::{ByteSecret, SensitiveValue};

/// Secret store backed by the login Keychain.
#[derive(Debug, Clone)]
pub struct KeychainSecretStore {
    namespace: String,
    account: String,
    enabled: bool,
}

impl KeychainSecretStore {
    /// Create a store filing items under `namespace` for the current user.
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            account: env::current_user(),
            enabled: true,
        }
    }

    /// Enable or disable the backend.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn service(&self, id: &str) -> Result<String> {
        validate_id(id)?;
        Ok(service_name(&self.namespace, id))
    }
}

impl SecretStore for KeychainSecretStore {
    fn name(&self) -> &str {
        "keychain"
    }

    fn is_available(&self) -> Result<bool> {
        Ok(self.enabled && cfg!(target_os = "macos"))
    }

    fn has_secret(&self, id: &str) -> Result<bool> {
        Ok(self.get_secret(id)?.is_some())
    }

    fn get_secret(&self, id: &str) -> Result<Option<ByteSecret>> {
        let service = self.service(id)?;
        let found = platform::get(&service, &self.account)?;
        if found.is_some() {
            debug!(service, "found keychain item");
        }
        Ok(found.map(SensitiveValue::wrap))
    }

    fn set_secret(&self, id: &str, secret: &[u8]) -> Result<()> {
        let service = self.service(id)?;
        debug!(service, "writing keychain item");
        platform::set(&service, &self.account, secret)
    }

    fn delete_secret(&self, id: &str) -> Result<()> {
        let service = self.service(id)?;
        debug!(service, "deleting keychain item");
        platform::delete(&service, &self.account)
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use security_framework::passwords::{
        delete_generic_password, get_generic_password, set_generic_password,
    };

    use crate::error::{Result, SecretError};

    /// errSecItemNotFound
    const ITEM_NOT_FOUND: i32 = -25300;

    pub(super) fn get(service: &str, account: &str) -> Result<Option<Vec<u8>>> {
        match get_generic_password(service, account) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.code() == ITEM_NOT_FOUND => Ok(None),
            Err(e) => Err(SecretError::Keychain(format!("keychain read failed: {e}"))),
        }
    }

    pub(super) fn set(service: &str, account: &str, secret: &[u8]) -> Result<()> {
        set_generic_password(service, account, secret)
            .map_err(|e| SecretError::Keychain(format!("keychain write failed: {e}")))
    }

    pub(super) fn delete(service: &str, account: &str) -> Result<()> {
        match delete_generic_password(service, account) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == ITEM_NOT_FOUND => Ok(()),
            Err(e) => Err(SecretError::Keychain(format!("keychain delete failed: {e}"))),
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    use crate::error::{Result, SecretError};

    fn unsupported() -> SecretError {
        SecretError::Keychain("Keychain is not available on this platform".to_string())
    }

    pub(super) fn get(_service: &str, _account: &str) -> Result<Option<Vec<u8>>> {
        Err(unsupported())
    }

    pub(super) fn set(_service: &str, _account: &str, _secret: &[u8]) -> Result<()> {
        Err(unsupported())
    }

    pub(super) fn delete(_service: &str, _account: &str) -> Result<()> {
        Err(unsupported())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SecretError;

    #[test]
    fn test_name_and_toggle() {
        let store = KeychainSecretStore::new("sealkeep");
        assert_eq!(store.name(), "keychain");
        assert!(!store.enabled(false).is_available().unwrap());
    }

    #[test]
    fn test_invalid_id_rejected_before_vault_access() {
        let store = KeychainSecretStore::new("sealkeep");
        assert!(matches!(
            store.get_secret("../x"),
            Err(SecretError::InvalidId(_))
        ));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_unavailable_off_macos() {
        let store = KeychainSecretStore::new("sealkeep");
        assert!(!store.is_available().unwrap());
        assert!(matches!(
            store.set_secret("app", b"x"),
            Err(SecretError::Keychain(_))
        ));
    }
}
