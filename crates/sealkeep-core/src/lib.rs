//! # sealkeep-core
//!
//! Core configuration and utilities for Sealkeep.
//!
//! This crate provides shared functionality used across all Sealkeep crates:
//!
//! - **Configuration**: Loading, validation, and environment overrides
//! - **Paths**: Resolution of the base, config, and secrets directories
//! - **Environment**: Typed access to environment variables

pub mod config;
pub mod env;
pub mod error;
pub mod paths;

// Re-exports for convenience
pub use config::{Config, CryptoConfig, StorageConfig};
pub use error::{ConfigError, Result};
