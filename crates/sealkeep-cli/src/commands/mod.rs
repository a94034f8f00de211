//! CLI command implementations.

pub mod decrypt;
pub mod delete;
pub mod encrypt;
pub mod status;
