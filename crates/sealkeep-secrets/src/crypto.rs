//! AES-GCM encryption with PBKDF2-SHA256 key generation.
//!
//! Every encryption draws a fresh random 96-bit nonce which is prepended to
//! the output, so an envelope is `nonce || ciphertext || tag`. Keys are
//! 128 or 256 bits; other lengths are rejected.
//!
//! Buffers are sealed in one shot with `aes-gcm`. Streams are sealed
//! incrementally (AES-CTR keystream plus GHASH) so that no more than one
//! chunk of plaintext is held at a time; the framing is identical.

use std::io::{self, Read, Write};

use aes::cipher::BlockEncrypt;
use aes::{Aes128, Aes256};
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce, Tag};
use ctr::cipher::{KeyIvInit, StreamCipher};
use ghash::universal_hash::UniversalHash;
use ghash::GHash;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Result, SecretError};
use crate::sensitive::{ByteSecret, SafeBuffer, SensitiveValue};

/// Length of the key derivation salt.
pub const SALT_LEN: usize = 8;

/// Length of the per-encryption nonce.
pub const NONCE_LEN: usize = 12;

/// Length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// PBKDF2 iteration count used when generating keys.
pub const KDF_ROUNDS: u32 = 65_536;

/// Chunk size used when streaming.
pub const STREAM_CHUNK_LEN: usize = 512;

const BLOCK_LEN: usize = 16;

/// Draw a random key derivation salt.
pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Draw a random nonce.
pub fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Derive a `key_len` byte key from `salt` via PBKDF2-HMAC-SHA256.
///
/// The password is empty: the random salt is the only entropy source.
pub fn derive_key(salt: &[u8], key_len: usize) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; key_len]);
    pbkdf2_hmac::<Sha256>(&[], salt, KDF_ROUNDS, key.as_mut_slice());
    key
}

enum GcmCipher {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl GcmCipher {
    fn new(key: &[u8]) -> Result<Self> {
        let init_err = |e: aes::cipher::InvalidLength| SecretError::Encryption(e.to_string());
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key)
                .map(Self::Aes128)
                .map_err(init_err),
            32 => Aes256Gcm::new_from_slice(key)
                .map(Self::Aes256)
                .map_err(init_err),
            n => Err(SecretError::UnsupportedKeyLength(n * 8)),
        }
    }

    fn encrypt_in_place(&self, nonce: &[u8], buffer: &mut [u8]) -> Option<Tag> {
        let nonce = Nonce::from_slice(nonce);
        match self {
            Self::Aes128(c) => c.encrypt_in_place_detached(nonce, b"", buffer),
            Self::Aes256(c) => c.encrypt_in_place_detached(nonce, b"", buffer),
        }
        .ok()
    }

    fn decrypt_in_place(&self, nonce: &[u8], buffer: &mut [u8], tag: &[u8]) -> bool {
        let nonce = Nonce::from_slice(nonce);
        let tag = Tag::from_slice(tag);
        match self {
            Self::Aes128(c) => c.decrypt_in_place_detached(nonce, b"", buffer, tag),
            Self::Aes256(c) => c.decrypt_in_place_detached(nonce, b"", buffer, tag),
        }
        .is_ok()
    }
}

/// Encrypt `plaintext` under `key`, returning `nonce || ciphertext || tag`.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = GcmCipher::new(key)?;
    let nonce = random_nonce();

    let mut envelope = Vec::with_capacity(NONCE_LEN + plaintext.len() + TAG_LEN);
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(plaintext);

    match cipher.encrypt_in_place(&nonce, &mut envelope[NONCE_LEN..]) {
        Some(tag) => {
            envelope.extend_from_slice(&tag);
            Ok(envelope)
        }
        None => {
            envelope.zeroize();
            Err(SecretError::Encryption("AES-GCM encryption failed".to_string()))
        }
    }
}

/// Decrypt and verify an envelope produced by [`seal`] or [`seal_stream`].
pub fn open(key: &[u8], envelope: &[u8]) -> Result<ByteSecret> {
    let cipher = GcmCipher::new(key)?;
    if envelope.len() < NONCE_LEN + TAG_LEN {
        return Err(SecretError::format(format!(
            "encrypted data too short: {} bytes",
            envelope.len()
        )));
    }

    let (nonce, rest) = envelope.split_at(NONCE_LEN);
    let (ciphertext, tag) = rest.split_at(rest.len() - TAG_LEN);

    let mut plain = ciphertext.to_vec();
    if cipher.decrypt_in_place(nonce, &mut plain, tag) {
        Ok(SensitiveValue::wrap(plain))
    } else {
        plain.zeroize();
        Err(SecretError::Decryption)
    }
}

/// Encrypt everything readable from `input` into `output`.
///
/// Writes the nonce first, then each encrypted chunk as it is read, and
/// the tag once `input` is exhausted. Returns the number of plaintext bytes.
pub fn seal_stream<R: Read + ?Sized, W: Write + ?Sized>(
    key: &[u8],
    input: &mut R,
    output: &mut W,
) -> Result<u64> {
    let nonce = random_nonce();
    let mut stream = SealStream::new(key, &nonce)?;
    output.write_all(&nonce)?;

    let mut chunk = Zeroizing::new([0u8; STREAM_CHUNK_LEN]);
    let mut total = 0u64;
    loop {
        let n = read_chunk(input, &mut chunk[..])?;
        if n == 0 {
            break;
        }
        total += n as u64;
        stream.update(&mut chunk[..n]);
        output.write_all(&chunk[..n])?;
    }
    output.write_all(&stream.finish())?;
    Ok(total)
}

/// Decrypt an envelope read from `input` into `output`.
///
/// Plaintext is only written once the tag has been verified. Returns the
/// number of plaintext bytes written.
pub fn open_stream<R: Read + ?Sized, W: Write + ?Sized>(
    key: &[u8],
    input: &mut R,
    output: &mut W,
) -> Result<u64> {
    let mut envelope = SafeBuffer::default();
    let mut chunk = [0u8; STREAM_CHUNK_LEN];
    loop {
        let n = read_chunk(input, &mut chunk)?;
        if n == 0 {
            break;
        }
        envelope.write_all(&chunk[..n])?;
    }

    let plain = envelope.into_secret().with_value(|e| open(key, e))?;
    plain.with_value(|p| -> Result<u64> {
        output.write_all(p)?;
        Ok(p.len() as u64)
    })
}

fn read_chunk<R: Read + ?Sized>(input: &mut R, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match input.read(chunk) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

enum BlockKey {
    Aes128(Aes128),
    Aes256(Aes256),
}

impl BlockKey {
    fn new(key: &[u8]) -> Result<Self> {
        let init_err = |e: aes::cipher::InvalidLength| SecretError::Encryption(e.to_string());
        match key.len() {
            16 => Aes128::new_from_slice(key).map(Self::Aes128).map_err(init_err),
            32 => Aes256::new_from_slice(key).map(Self::Aes256).map_err(init_err),
            n => Err(SecretError::UnsupportedKeyLength(n * 8)),
        }
    }

    fn encrypt_block(&self, block: &mut [u8; BLOCK_LEN]) {
        let block = aes::Block::from_mut_slice(&mut block[..]);
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }
}

enum Keystream {
    Aes128(ctr::Ctr32BE<Aes128>),
    Aes256(ctr::Ctr32BE<Aes256>),
}

impl Keystream {
    fn new(key: &[u8], counter: &[u8; BLOCK_LEN]) -> Result<Self> {
        let init_err = |e: aes::cipher::InvalidLength| SecretError::Encryption(e.to_string());
        match key.len() {
            16 => ctr::Ctr32BE::<Aes128>::new_from_slices(key, counter)
                .map(Self::Aes128)
                .map_err(init_err),
            32 => ctr::Ctr32BE::<Aes256>::new_from_slices(key, counter)
                .map(Self::Aes256)
                .map_err(init_err),
            n => Err(SecretError::UnsupportedKeyLength(n * 8)),
        }
    }

    fn apply(&mut self, data: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.apply_keystream(data),
            Self::Aes256(c) => c.apply_keystream(data),
        }
    }
}

/// Incremental AES-GCM encryption state for one nonce.
///
/// Produces the same ciphertext and tag as a one-shot AES-GCM encryption
/// with an empty associated data string.
pub struct SealStream {
    keystream: Keystream,
    ghash: GHash,
    tag_mask: [u8; BLOCK_LEN],
    pending: [u8; BLOCK_LEN],
    pending_len: usize,
    ciphertext_len: u64,
}

impl SealStream {
    /// Start a stream for `key` and a 96-bit `nonce`.
    pub fn new(key: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Self> {
        let block_key = BlockKey::new(key)?;

        let mut hash_key = [0u8; BLOCK_LEN];
        block_key.encrypt_block(&mut hash_key);
        let ghash = GHash::new(&ghash::Key::from(hash_key));
        hash_key.zeroize();

        // J0 = nonce || 0^31 || 1; the tag mask is E(J0), data starts at J0 + 1.
        let mut j0 = [0u8; BLOCK_LEN];
        j0[..NONCE_LEN].copy_from_slice(nonce);
        j0[BLOCK_LEN - 1] = 1;

        let mut tag_mask = j0;
        block_key.encrypt_block(&mut tag_mask);

        let mut counter = j0;
        counter[BLOCK_LEN - 1] = 2;

        Ok(Self {
            keystream: Keystream::new(key, &counter)?,
            ghash,
            tag_mask,
            pending: [0u8; BLOCK_LEN],
            pending_len: 0,
            ciphertext_len: 0,
        })
    }

    /// Encrypt `chunk` in place.
    pub fn update(&mut self, chunk: &mut [u8]) {
        self.keystream.apply(chunk);
        self.absorb(chunk);
        self.ciphertext_len += chunk.len() as u64;
    }

    /// Finish the stream and return the authentication tag.
    pub fn finish(mut self) -> [u8; TAG_LEN] {
        if self.pending_len > 0 {
            self.ghash.update_padded(&self.pending[..self.pending_len]);
        }

        // len(A) || len(C) in bits; there is no associated data.
        let mut lengths = [0u8; BLOCK_LEN];
        lengths[8..].copy_from_slice(&(self.ciphertext_len * 8).to_be_bytes());
        self.ghash.update(&[ghash::Block::from(lengths)]);

        let digest = self.ghash.finalize();
        let mut tag = [0u8; TAG_LEN];
        for (i, byte) in tag.iter_mut().enumerate() {
            *byte = digest[i] ^ self.tag_mask[i];
        }
        self.tag_mask.zeroize();
        tag
    }

    // GHASH consumes whole blocks, so partial input waits in `pending`.
    fn absorb(&mut self, mut data: &[u8]) {
        if self.pending_len > 0 {
            let take = (BLOCK_LEN - self.pending_len).min(data.len());
            self.pending[self.pending_len..self.pending_len + take].copy_from_slice(&data[..take]);
            self.pending_len += take;
            data = &data[take..];
            if self.pending_len < BLOCK_LEN {
                return;
            }
            self.ghash.update(&[ghash::Block::from(self.pending)]);
            self.pending_len = 0;
        }

        let mut blocks = data.chunks_exact(BLOCK_LEN);
        for block in &mut blocks {
            self.ghash.update(&[ghash::Block::clone_from_slice(block)]);
        }
        let rest = blocks.remainder();
        self.pending[..rest.len()].copy_from_slice(rest);
        self.pending_len = rest.len();
    }
}
