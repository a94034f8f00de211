//! Shared fixtures for Sealkeep integration tests.

use sealkeep_core::Config;
use tempfile::TempDir;

/// A config whose only enabled backend is the file store inside `dir`.
pub fn file_only_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.secrets_dir = Some(dir.path().join("secrets"));
    config.storage.keychain = false;
    config.storage.credential_manager = false;
    config
}
