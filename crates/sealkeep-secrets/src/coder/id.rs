//! The closed set of storable coder kinds.

use std::fmt;

use sealkeep_core::config::DEFAULT_MAX_KEY_BITS;
use sealkeep_core::env;

use super::aes_coder::AesCoder;
use super::master::MasterSecret;
use super::StorableCoder;
use crate::error::{Result, SecretError};
use crate::sensitive::{SensitiveValue, Wipe};

/// Supported [`StorableCoder`] kinds.
///
/// The ordinal is what a stored secret records in its header, so variants
/// must only ever be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoderId {
    /// AES-GCM with a 128 bit key.
    Aes128,
    /// AES-GCM with a 256 bit key.
    Aes256,
}

impl CoderId {
    /// All coder kinds in ordinal order.
    pub const ALL: [CoderId; 2] = [CoderId::Aes128, CoderId::Aes256];

    /// Header ordinal of this coder kind.
    pub fn ordinal(self) -> u32 {
        match self {
            Self::Aes128 => 0,
            Self::Aes256 => 1,
        }
    }

    /// Look up a coder kind by its header ordinal.
    pub fn from_ordinal(ordinal: u32) -> Result<Self> {
        match ordinal {
            0 => Ok(Self::Aes128),
            1 => Ok(Self::Aes256),
            other => Err(SecretError::format(format!("Unexpected coder id: {other}"))),
        }
    }

    /// Look up the AES coder kind for a key length in bits.
    pub fn from_key_bits(bits: usize) -> Result<Self> {
        match bits {
            128 => Ok(Self::Aes128),
            256 => Ok(Self::Aes256),
            other => Err(SecretError::UnsupportedKeyLength(other)),
        }
    }

    pub fn key_bits(self) -> usize {
        match self {
            Self::Aes128 => 128,
            Self::Aes256 => 256,
        }
    }

    /// Key length in bytes.
    pub fn key_len(self) -> usize {
        self.key_bits() / 8
    }

    /// Default coder for the running deployment.
    ///
    /// Evaluated on every call: AES-256 unless `SEALKEEP_MAX_KEY_BITS`
    /// caps usable key lengths below 256 bits.
    pub fn default_coder() -> Self {
        let max_key_bits = env::get_u32(env::MAX_KEY_BITS_VAR).unwrap_or(DEFAULT_MAX_KEY_BITS);
        Self::default_for(max_key_bits)
    }

    /// Strongest coder allowed under a `max_key_bits` cap.
    pub fn default_for(max_key_bits: u32) -> Self {
        if max_key_bits >= 256 {
            Self::Aes256
        } else {
            Self::Aes128
        }
    }

    /// Create a brand-new coder of this kind with fresh key material.
    pub fn new_coder(self) -> StorableCoder {
        match self {
            Self::Aes128 | Self::Aes256 => StorableCoder::Aes(AesCoder::generate(self)),
        }
    }

    /// Reload a coder of this kind from a secret previously produced by
    /// [`StorableCoder::store`].
    ///
    /// Fails if the secret header names a different coder kind.
    pub fn load_coder<T>(self, secret: &SensitiveValue<T>) -> Result<StorableCoder>
    where
        T: Wipe + AsRef<[u8]>,
    {
        secret.with_value(|blob| self.load_from(blob.as_ref()))
    }

    pub(crate) fn load_from(self, blob: &[u8]) -> Result<StorableCoder> {
        let master = MasterSecret::decode_as(self, blob)?;
        match self {
            Self::Aes128 | Self::Aes256 => Ok(StorableCoder::Aes(AesCoder::from_master(master))),
        }
    }
}

impl fmt::Display for CoderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes128 => f.write_str("AES128"),
            Self::Aes256 => f.write_str("AES256"),
        }
    }
}
