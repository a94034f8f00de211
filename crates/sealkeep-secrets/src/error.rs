//! Error types for secret management.

use sealkeep_core::ConfigError;
use thiserror::Error;

/// Errors that can occur during secret operations.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Malformed stored secret or envelope.
    #[error("Invalid secret format: {0}")]
    Format(String),

    /// Authentication tag did not verify (tampered data or wrong key).
    #[error("Decryption failed")]
    Decryption,

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Unsupported key length: {0} bits")]
    UnsupportedKeyLength(usize),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Credential Manager error: {0}")]
    CredentialManager(String),

    #[error("No secret store available on this platform")]
    NoBackendAvailable,

    #[error("Invalid secret id: {0}")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SecretError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }
}

/// Convenience result alias for secret operations.
pub type Result<T> = std::result::Result<T, SecretError>;
