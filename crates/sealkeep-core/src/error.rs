//! Errors raised while locating, reading, or validating configuration.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} does not exist", .0.display())]
    NotFound(PathBuf),

    /// Serializing the config for `save` failed.
    #[error("cannot serialize config: {0}")]
    Parse(String),

    /// One or more rules in `Config::validate` failed, joined with "; ".
    #[error("invalid config: {0}")]
    Validation(String),

    #[error("cannot determine home directory; set SEALKEEP_HOME")]
    NoHomeDir,

    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json5 config: {0}")]
    Json5(String),
}
