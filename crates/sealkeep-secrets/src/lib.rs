//! Per-identity secure storage for small sensitive values.
//!
//! A master secret is generated once per identity, persisted through the
//! first suitable [`SecretStore`] backend, and used to drive AES-GCM
//! encryption of caller-supplied tokens and passwords. Every sensitive
//! buffer passing through the crate is held in a [`SensitiveValue`] and
//! wiped when it goes out of scope.

pub mod cipher;
pub mod coder;
pub mod crypto;
pub mod error;
pub mod policy;
pub mod sensitive;
pub mod storage;
pub mod store;

pub use cipher::AuthenticatedCipher;
pub use coder::{CoderId, StorableCoder};
pub use error::{Result, SecretError};
pub use policy::{select_store, Selection};
pub use sensitive::{ByteSecret, CharSecret, SafeBuffer, SensitiveValue, Wipe};
pub use storage::SecureStorage;
pub use store::{
    default_stores, CredentialManagerSecretStore, FileSecretStore, KeychainSecretStore,
    MemorySecretStore, SecretStore,
};
