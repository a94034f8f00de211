//! One-shot authenticated encryption keyed by a stored master secret.

use tracing::debug;

use crate::coder::{CoderId, MasterSecret};
use crate::crypto;
use crate::error::Result;
use crate::sensitive::{ByteSecret, SensitiveValue, Wipe};

/// AES-GCM cipher over whole buffers.
///
/// Ciphertexts are laid out as `nonce (12) || ciphertext || tag (16)`. The
/// key material is zeroed when the cipher is dropped.
#[derive(Debug)]
pub struct AuthenticatedCipher {
    master: MasterSecret,
}

impl AuthenticatedCipher {
    /// Generate a fresh master secret for a `key_bits` AES key.
    ///
    /// Only 128 and 256 bit keys are supported.
    pub fn generate(key_bits: usize) -> Result<ByteSecret> {
        let id = CoderId::from_key_bits(key_bits)?;
        debug!(coder = %id, "generating master secret");
        Ok(MasterSecret::generate(id).encode())
    }

    /// Build a cipher from a secret produced by [`generate`](Self::generate).
    pub fn from_secret<T>(secret: &SensitiveValue<T>) -> Result<Self>
    where
        T: Wipe + AsRef<[u8]>,
    {
        let master = secret.with_value(|blob| MasterSecret::decode(blob.as_ref()))?;
        Ok(Self { master })
    }

    pub fn id(&self) -> CoderId {
        self.master.id()
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        crypto::seal(self.master.key(), plaintext)
    }

    /// Verify and decrypt an envelope produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, envelope: &[u8]) -> Result<ByteSecret> {
        crypto::open(self.master.key(), envelope)
    }
}
