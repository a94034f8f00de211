//! Configuration loading and persistence.

use super::Config;
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

impl Config {
    /// Load configuration from the default path, falling back to defaults
    /// when no config file exists. Environment overrides are applied.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load_or_default(&path)
    }

    /// Load configuration from `path` if present, defaults otherwise.
    /// Environment overrides are applied and the result is validated.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let mut config = match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Apply `SEALKEEP_*` environment overrides on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(enabled) = env::get_opt_bool(env::KEYCHAIN_VAR) {
            self.storage.keychain = enabled;
        }
        if let Some(enabled) = env::get_opt_bool(env::CREDENTIAL_MANAGER_VAR) {
            self.storage.credential_manager = enabled;
        }
        if let Some(bits) = env::get_u32(env::MAX_KEY_BITS_VAR) {
            self.crypto.max_key_bits = bits;
        }
    }

    /// Resolve the directory used by the file backend.
    pub fn secrets_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.secrets_dir {
            Some(dir) => Ok(paths::expand_tilde(&dir.to_string_lossy())),
            None => paths::secrets_dir(),
        }
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.crypto.max_key_bits < 128 {
            errors.push(format!(
                "crypto.max_key_bits must be at least 128, got {}",
                self.crypto.max_key_bits
            ));
        }

        if self.storage.namespace.trim().is_empty() {
            errors.push("storage.namespace must not be empty".to_string());
        }

        if !(self.storage.keychain || self.storage.credential_manager || self.storage.file) {
            errors.push("At least one secret store backend must be enabled".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}
