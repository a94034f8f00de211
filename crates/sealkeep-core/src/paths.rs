//! Path resolution utilities.

use crate::env;
use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the Sealkeep base directory (`$SEALKEEP_HOME` or `~/.sealkeep`).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = env::get_var(env::HOME_VAR) {
        return Ok(expand_tilde(&home));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".sealkeep"))
}

/// Get the main config file path (`<base>/sealkeep.json5`).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("sealkeep.json5"))
}

/// Get the default directory of file-backed master secrets (`<base>/secrets`).
pub fn secrets_dir() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("secrets"))
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
