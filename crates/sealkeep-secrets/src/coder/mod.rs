//! Storable coders.
//!
//! A [`StorableCoder`] encrypts and decrypts byte streams and can export
//! its key material with [`StorableCoder::store`] so that an equivalent
//! coder can be rebuilt later with [`StorableCoder::load`].

mod aes_coder;
mod id;
mod master;

use std::fmt;
use std::io::{Read, Write};

pub use aes_coder::AesCoder;
pub use id::CoderId;
pub use master::{read_ordinal, MasterSecret, HEADER_LEN};

use crate::crypto::{NONCE_LEN, TAG_LEN};
use crate::error::Result;
use crate::sensitive::{ByteSecret, SafeBuffer, SensitiveValue, Wipe};

/// A coder whose key material can be persisted and reloaded.
#[derive(Debug)]
pub enum StorableCoder {
    Aes(AesCoder),
}

impl StorableCoder {
    /// Rebuild a coder from a secret produced by [`store`](Self::store).
    ///
    /// The header selects the coder kind.
    pub fn load<T>(secret: &SensitiveValue<T>) -> Result<Self>
    where
        T: Wipe + AsRef<[u8]>,
    {
        secret.with_value(|blob| {
            let blob = blob.as_ref();
            let id = CoderId::from_ordinal(read_ordinal(blob)?)?;
            id.load_from(blob)
        })
    }

    pub fn id(&self) -> CoderId {
        match self {
            Self::Aes(coder) => coder.id(),
        }
    }

    /// Export the key material, header first.
    pub fn store(&self) -> ByteSecret {
        match self {
            Self::Aes(coder) => coder.store(),
        }
    }

    /// Encrypt everything readable from `input` into `output`.
    pub fn encrypt_stream<R: Read + ?Sized, W: Write + ?Sized>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<u64> {
        match self {
            Self::Aes(coder) => coder.encrypt_stream(input, output),
        }
    }

    /// Decrypt an envelope from `input`, writing the plaintext to `output`
    /// only after it has been authenticated.
    pub fn decrypt_stream<R: Read + ?Sized, W: Write + ?Sized>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<u64> {
        match self {
            Self::Aes(coder) => coder.decrypt_stream(input, output),
        }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(NONCE_LEN + plaintext.len() + TAG_LEN);
        self.encrypt_stream(&mut &plaintext[..], &mut out)?;
        Ok(out)
    }

    pub fn decrypt(&self, encrypted: &[u8]) -> Result<ByteSecret> {
        let mut out = SafeBuffer::with_capacity(encrypted.len());
        self.decrypt_stream(&mut &encrypted[..], &mut out)?;
        Ok(out.into_secret())
    }
}

impl fmt::Display for StorableCoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
