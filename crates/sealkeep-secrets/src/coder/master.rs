//! Exportable master secret: coder id, salt, and raw key bytes.
//!
//! Stored layout:
//!
//! ```text
//! [4-byte LE coder ordinal][8-byte salt][key bytes, key_bits / 8]
//! ```

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

use super::CoderId;
use crate::crypto::{self, SALT_LEN};
use crate::error::{Result, SecretError};
use crate::sensitive::{ByteSecret, SensitiveValue};

/// Length of the coder id header.
pub const HEADER_LEN: usize = 4;

/// Raw key material together with its provenance.
pub struct MasterSecret {
    id: CoderId,
    salt: [u8; SALT_LEN],
    key: Zeroizing<Vec<u8>>,
}

impl MasterSecret {
    /// Generate fresh key material for `id` from a random salt.
    pub fn generate(id: CoderId) -> Self {
        let salt = crypto::random_salt();
        let key = crypto::derive_key(&salt, id.key_len());
        Self { id, salt, key }
    }

    /// Decode a stored secret, dispatching on its header.
    pub fn decode(blob: &[u8]) -> Result<Self> {
        let id = CoderId::from_ordinal(read_ordinal(blob)?)?;
        Self::decode_as(id, blob)
    }

    /// Decode a stored secret that must have been produced by `expected`.
    pub fn decode_as(expected: CoderId, blob: &[u8]) -> Result<Self> {
        let ordinal = read_ordinal(blob)?;
        if ordinal != expected.ordinal() {
            return Err(SecretError::format(format!("Unexpected coder id: {ordinal}")));
        }

        let body = &blob[HEADER_LEN..];
        if body.len() < SALT_LEN {
            return Err(SecretError::format(format!(
                "Invalid {expected} coder secret: {} bytes",
                blob.len()
            )));
        }

        let (salt, key) = body.split_at(SALT_LEN);
        if key.len() != expected.key_len() {
            return Err(SecretError::format(format!(
                "Invalid {expected} key length: {} bytes",
                key.len()
            )));
        }

        let mut salt_bytes = [0u8; SALT_LEN];
        salt_bytes.copy_from_slice(salt);
        Ok(Self {
            id: expected,
            salt: salt_bytes,
            key: Zeroizing::new(key.to_vec()),
        })
    }

    /// Export in the stored layout.
    pub fn encode(&self) -> ByteSecret {
        let mut blob = Vec::with_capacity(HEADER_LEN + SALT_LEN + self.key.len());
        blob.extend_from_slice(&self.id.ordinal().to_le_bytes());
        blob.extend_from_slice(&self.salt);
        blob.extend_from_slice(&self.key);
        SensitiveValue::wrap(blob)
    }

    pub fn id(&self) -> CoderId {
        self.id
    }

    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }
}

/// Parse the little-endian coder ordinal at the start of a stored secret.
pub fn read_ordinal(blob: &[u8]) -> Result<u32> {
    match blob.get(..HEADER_LEN) {
        Some(header) => {
            let mut ordinal = [0u8; HEADER_LEN];
            ordinal.copy_from_slice(header);
            Ok(u32::from_le_bytes(ordinal))
        }
        None => Err(SecretError::format(format!(
            "Unexpected secret header length: {}",
            blob.len()
        ))),
    }
}

impl Drop for MasterSecret {
    fn drop(&mut self) {
        self.salt.zeroize();
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterSecret")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
