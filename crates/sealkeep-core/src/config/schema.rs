//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default namespace for OS vault credentials.
pub const DEFAULT_NAMESPACE: &str = "sealkeep";

/// Default cap on usable AES key length.
pub const DEFAULT_MAX_KEY_BITS: u32 = 256;

/// Main Sealkeep configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Secret store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Cryptographic capability settings.
    #[serde(default)]
    pub crypto: CryptoConfig,
}

/// Secret store configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the file backend; defaults to `<base>/secrets`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets_dir: Option<PathBuf>,

    /// Namespace under which OS vault credentials are filed.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Enable the macOS Keychain backend.
    #[serde(default = "default_true")]
    pub keychain: bool,

    /// Enable the Windows Credential Manager backend.
    #[serde(default = "default_true")]
    pub credential_manager: bool,

    /// Enable the plain file backend.
    #[serde(default = "default_true")]
    pub file: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            secrets_dir: None,
            namespace: default_namespace(),
            keychain: true,
            credential_manager: true,
            file: true,
        }
    }
}

/// Cryptographic capability section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Largest AES key length the deployment may use.
    #[serde(default = "default_max_key_bits")]
    pub max_key_bits: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            max_key_bits: default_max_key_bits(),
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_key_bits() -> u32 {
    DEFAULT_MAX_KEY_BITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.namespace, "sealkeep");
        assert!(config.storage.keychain);
        assert!(config.storage.credential_manager);
        assert!(config.storage.file);
        assert!(config.storage.secrets_dir.is_none());
        assert_eq!(config.crypto.max_key_bits, 256);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config = json5::from_str("{ storage: { keychain: false } }").unwrap();
        assert!(!config.storage.keychain);
        assert!(config.storage.file);
        assert_eq!(config.storage.namespace, "sealkeep");
        assert_eq!(config.crypto, CryptoConfig::default());
    }
}
