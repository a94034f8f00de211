//! Per-identity secure storage facade.
//!
//! A [`SecureStorage`] selects a backend once, when it is created. Every
//! encrypt or decrypt call then fetches the master secret from that backend
//! (generating and persisting one on first use), builds a short-lived
//! [`AuthenticatedCipher`], and drops it again before returning. No key
//! material is cached between calls.
//!
//! Two processes creating the first secret for the same id at the same time
//! may both generate one; the last write wins. Callers that need stronger
//! guarantees must serialize first use themselves.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sealkeep_core::Config;
use tracing::{debug, info};

use crate::cipher::AuthenticatedCipher;
use crate::coder::CoderId;
use crate::error::{Result, SecretError};
use crate::policy::{select_store, Selection};
use crate::sensitive::{ByteSecret, CharSecret, SensitiveValue, Wipe};
use crate::store::{default_stores, validate_id, SecretStore};

/// Encrypts and decrypts caller secrets under the master secret for one id.
pub struct SecureStorage {
    id: String,
    store: Box<dyn SecretStore>,
    coder: CoderId,
}

impl SecureStorage {
    /// Create storage for `id` using the configuration at the default path.
    pub fn create(id: &str) -> Result<Self> {
        let config = Config::load_default()?;
        Self::create_with_config(id, &config)
    }

    /// Create storage for `id` using the backends enabled by `config`.
    pub fn create_with_config(id: &str, config: &Config) -> Result<Self> {
        Self::create_with(id, default_stores(config)?, config.crypto.max_key_bits)
    }

    /// Create storage for `id`, selecting among `stores` in priority order.
    ///
    /// New master secrets use the strongest coder allowed by `max_key_bits`.
    pub fn create_with(
        id: &str,
        stores: Vec<Box<dyn SecretStore>>,
        max_key_bits: u32,
    ) -> Result<Self> {
        validate_id(id)?;

        let selection = select_store(&stores, id)?;
        let store = selection
            .index()
            .and_then(|index| stores.into_iter().nth(index))
            .ok_or(SecretError::NoBackendAvailable)?;

        match selection {
            Selection::Preferred(_) => {
                info!(id, store = store.name(), "using existing master secret")
            }
            _ => info!(id, store = store.name(), "selected secret store"),
        }

        Ok(Self {
            id: id.to_string(),
            store,
            coder: CoderId::default_for(max_key_bits),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the selected backend.
    pub fn backend_name(&self) -> &str {
        self.store.name()
    }

    /// Coder used when a new master secret has to be generated.
    pub fn coder_id(&self) -> CoderId {
        self.coder
    }

    /// Whether the selected backend currently holds a master secret.
    pub fn has_secret(&self) -> Result<bool> {
        self.store.has_secret(&self.id)
    }

    /// Encrypt a byte secret. The caller keeps ownership of `secret`.
    pub fn encrypt_bytes<T>(&self, secret: &SensitiveValue<T>) -> Result<Vec<u8>>
    where
        T: Wipe + AsRef<[u8]>,
    {
        let cipher = self.cipher()?;
        secret.with_value(|plain| cipher.encrypt(plain.as_ref()))
    }

    /// Decrypt `encrypted` and hand the plaintext to `consumer`.
    ///
    /// The plaintext buffer is wiped as soon as `consumer` returns, or while
    /// unwinding if it panics.
    pub fn decrypt_bytes<R>(
        &self,
        encrypted: &[u8],
        consumer: impl FnOnce(&[u8]) -> R,
    ) -> Result<R> {
        let plain = self.decrypt_to_secret(encrypted)?;
        let result = plain.with_value(|p| consumer(p));
        plain.dispose();
        Ok(result)
    }

    /// [`encrypt_bytes`](Self::encrypt_bytes) with base64 output.
    pub fn encrypt_bytes_base64<T>(&self, secret: &SensitiveValue<T>) -> Result<String>
    where
        T: Wipe + AsRef<[u8]>,
    {
        Ok(BASE64.encode(self.encrypt_bytes(secret)?))
    }

    /// [`decrypt_bytes`](Self::decrypt_bytes) with base64 input.
    pub fn decrypt_bytes_base64<R>(
        &self,
        encrypted: &str,
        consumer: impl FnOnce(&[u8]) -> R,
    ) -> Result<R> {
        let encrypted = BASE64.decode(encrypted.trim())?;
        self.decrypt_bytes(&encrypted, consumer)
    }

    /// Encrypt a UTF-16 secret, two little-endian bytes per code unit.
    pub fn encrypt_chars<T>(&self, secret: &SensitiveValue<T>) -> Result<Vec<u8>>
    where
        T: Wipe + AsRef<[u16]>,
    {
        let bytes = secret.map(|chars| chars_to_bytes(chars.as_ref()));
        let encrypted = self.encrypt_bytes(&bytes);
        bytes.dispose();
        encrypted
    }

    /// Decrypt `encrypted` as UTF-16 and hand the code units to `consumer`.
    ///
    /// A trailing odd byte is ignored. Both the byte and the char buffer are
    /// wiped before returning.
    pub fn decrypt_chars<R>(
        &self,
        encrypted: &[u8],
        consumer: impl FnOnce(&[u16]) -> R,
    ) -> Result<R> {
        let plain = self.decrypt_to_secret(encrypted)?;
        let chars: CharSecret = plain.map(|bytes| bytes_to_chars(bytes));
        plain.dispose();

        let result = chars.with_value(|c| consumer(c));
        chars.dispose();
        Ok(result)
    }

    /// [`encrypt_chars`](Self::encrypt_chars) with base64 output.
    pub fn encrypt_chars_base64<T>(&self, secret: &SensitiveValue<T>) -> Result<String>
    where
        T: Wipe + AsRef<[u16]>,
    {
        Ok(BASE64.encode(self.encrypt_chars(secret)?))
    }

    /// [`decrypt_chars`](Self::decrypt_chars) with base64 input.
    pub fn decrypt_chars_base64<R>(
        &self,
        encrypted: &str,
        consumer: impl FnOnce(&[u16]) -> R,
    ) -> Result<R> {
        let encrypted = BASE64.decode(encrypted.trim())?;
        self.decrypt_chars(&encrypted, consumer)
    }

    /// Remove the master secret from the backend.
    ///
    /// Ciphertext produced before this call can no longer be decrypted; the
    /// next encryption generates a new master secret.
    pub fn delete(&self) -> Result<()> {
        info!(id = %self.id, store = self.store.name(), "deleting master secret");
        self.store.delete_secret(&self.id)
    }

    fn decrypt_to_secret(&self, encrypted: &[u8]) -> Result<ByteSecret> {
        let cipher = self.cipher()?;
        cipher.decrypt(encrypted)
    }

    /// Build a cipher from the stored master secret, creating it if absent.
    fn cipher(&self) -> Result<AuthenticatedCipher> {
        if let Some(secret) = self.store.get_secret(&self.id)? {
            debug!(id = %self.id, store = self.store.name(), "loaded master secret");
            return AuthenticatedCipher::from_secret(&secret);
        }

        info!(
            id = %self.id,
            store = self.store.name(),
            coder = %self.coder,
            "generating master secret"
        );
        let secret = AuthenticatedCipher::generate(self.coder.key_bits())?;
        secret.with_value(|blob| self.store.set_secret(&self.id, blob))?;
        AuthenticatedCipher::from_secret(&secret)
    }
}

fn chars_to_bytes(chars: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(chars.len() * 2);
    for c in chars {
        bytes.extend_from_slice(&c.to_le_bytes());
    }
    bytes
}

fn bytes_to_chars(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

impl fmt::Display for SecureStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureStorage[{}:{}]", self.store.name(), self.id)
    }
}

impl fmt::Debug for SecureStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureStorage")
            .field("id", &self.id)
            .field("store", &self.store.name())
            .field("coder", &self.coder)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{NONCE_LEN, TAG_LEN};
    use crate::store::{FileSecretStore, MemorySecretStore};
    use tempfile::TempDir;

    const TOKEN: &[u8] = b"AVerySecretPassword4Testing";

    fn boxed(stores: &[&MemorySecretStore]) -> Vec<Box<dyn SecretStore>> {
        stores
            .iter()
            .map(|s| Box::new((*s).clone()) as Box<dyn SecretStore>)
            .collect()
    }

    fn memory_storage(store: &MemorySecretStore) -> SecureStorage {
        SecureStorage::create_with("app", boxed(&[store]), 256).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_bytes() {
        let store = MemorySecretStore::default();
        let storage = memory_storage(&store);
        assert!(!storage.has_secret().unwrap());

        let encrypted = storage.encrypt_bytes(&ByteSecret::wrap(TOKEN.to_vec())).unwrap();
        assert_eq!(TOKEN.len(), 27);
        assert_eq!(encrypted.len(), NONCE_LEN + 27 + TAG_LEN);
        assert!(storage.has_secret().unwrap());

        let decrypted = storage.decrypt_bytes(&encrypted, |p| p.to_vec()).unwrap();
        assert_eq!(decrypted, TOKEN);
    }

    #[test]
    fn test_master_secret_created_once() {
        let store = MemorySecretStore::default();
        let storage = memory_storage(&store);

        storage.encrypt_bytes(&ByteSecret::wrap(vec![1])).unwrap();
        let first = store.get_secret("app").unwrap().unwrap();
        storage.encrypt_bytes(&ByteSecret::wrap(vec![2])).unwrap();
        let second = store.get_secret("app").unwrap().unwrap();

        first.with_value(|a| second.with_value(|b| assert_eq!(a, b)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_recreated_storage_decrypts() {
        let store = MemorySecretStore::default();
        let encrypted = memory_storage(&store)
            .encrypt_bytes(&ByteSecret::wrap(TOKEN.to_vec()))
            .unwrap();

        let recreated = memory_storage(&store);
        let matches = recreated
            .decrypt_bytes(&encrypted, |p| p == TOKEN)
            .unwrap();
        assert!(matches);
    }

    #[test]
    fn test_delete_invalidates_ciphertext() {
        let store = MemorySecretStore::default();
        let storage = memory_storage(&store);
        let encrypted = storage.encrypt_bytes(&ByteSecret::wrap(TOKEN.to_vec())).unwrap();

        storage.delete().unwrap();
        assert!(!storage.has_secret().unwrap());

        let result = storage.decrypt_bytes(&encrypted, |p| p.to_vec());
        assert!(matches!(result, Err(SecretError::Decryption)));
        // Decrypting generated a replacement secret.
        assert!(storage.has_secret().unwrap());
    }

    #[test]
    fn test_caller_buffer_wiped_after_dispose() {
        let store = MemorySecretStore::default();
        let storage = memory_storage(&store);

        let mut token = TOKEN.to_vec();
        let secret = SensitiveValue::wrap(token.as_mut_slice());
        let encrypted = storage.encrypt_bytes(&secret).unwrap();
        secret.dispose();
        assert!(token.iter().all(|b| *b == 0));

        storage
            .decrypt_bytes(&encrypted, |p| assert_eq!(p, TOKEN))
            .unwrap();
    }

    #[test]
    fn test_buffers_wiped_when_consumer_panics() {
        let store = MemorySecretStore::default();
        let storage = memory_storage(&store);

        let mut token = TOKEN.to_vec();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let secret = SensitiveValue::wrap(token.as_mut_slice());
            let encrypted = storage.encrypt_bytes(&secret).unwrap();
            storage
                .decrypt_bytes(&encrypted, |_| panic!("consumer failed"))
                .unwrap();
        }));
        assert!(outcome.is_err());
        assert!(token.iter().all(|b| *b == 0));

        // The storage stays usable after the unwind.
        let encrypted = storage.encrypt_bytes(&ByteSecret::wrap(TOKEN.to_vec())).unwrap();
        let decrypted = storage.decrypt_bytes(&encrypted, |p| p.to_vec()).unwrap();
        assert_eq!(decrypted, TOKEN);
    }

    #[test]
    fn test_chars_round_trip() {
        let store = MemorySecretStore::default();
        let storage = memory_storage(&store);

        let password = CharSecret::from("p\u{e4}ssw\u{f6}rd");
        let encrypted = storage.encrypt_chars(&password).unwrap();
        assert_eq!(encrypted.len(), NONCE_LEN + 16 + TAG_LEN);

        let decoded = storage
            .decrypt_chars(&encrypted, String::from_utf16_lossy)
            .unwrap();
        assert_eq!(decoded, "p\u{e4}ssw\u{f6}rd");
    }

    #[test]
    fn test_chars_are_little_endian_pairs() {
        let store = MemorySecretStore::default();
        let storage = memory_storage(&store);

        let encrypted = storage.encrypt_chars(&CharSecret::from("A\u{100}")).unwrap();
        let bytes = storage.decrypt_bytes(&encrypted, |p| p.to_vec()).unwrap();
        assert_eq!(bytes, [0x41, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_odd_trailing_byte_dropped() {
        let store = MemorySecretStore::default();
        let storage = memory_storage(&store);

        let encrypted = storage
            .encrypt_bytes(&ByteSecret::wrap(vec![0x41, 0x00, 0x42]))
            .unwrap();
        let chars = storage.decrypt_chars(&encrypted, |c| c.to_vec()).unwrap();
        assert_eq!(chars, [0x41]);
    }

    #[test]
    fn test_base64_round_trip() {
        let store = MemorySecretStore::default();
        let storage = memory_storage(&store);

        let encoded = storage
            .encrypt_bytes_base64(&ByteSecret::wrap(TOKEN.to_vec()))
            .unwrap();
        assert_eq!(BASE64.decode(&encoded).unwrap().len(), NONCE_LEN + 27 + TAG_LEN);
        let decoded = storage
            .decrypt_bytes_base64(&encoded, |p| p.to_vec())
            .unwrap();
        assert_eq!(decoded, TOKEN);

        let encoded = storage
            .encrypt_chars_base64(&CharSecret::from("hunter2"))
            .unwrap();
        let decoded = storage
            .decrypt_chars_base64(&encoded, String::from_utf16_lossy)
            .unwrap();
        assert_eq!(decoded, "hunter2");
    }

    #[test]
    fn test_invalid_base64() {
        let store = MemorySecretStore::default();
        let storage = memory_storage(&store);
        assert!(matches!(
            storage.decrypt_bytes_base64("not base64!", |_| ()),
            Err(SecretError::Base64(_))
        ));
    }

    #[test]
    fn test_consumer_result_propagates() {
        let store = MemorySecretStore::default();
        let storage = memory_storage(&store);
        let encrypted = storage.encrypt_bytes(&ByteSecret::wrap(b"42".to_vec())).unwrap();

        let parsed = storage
            .decrypt_bytes(&encrypted, |p| -> std::result::Result<u32, String> {
                let text = std::str::from_utf8(p).map_err(|e| e.to_string())?;
                text.parse::<u32>().map_err(|e| e.to_string())
            })
            .unwrap();
        assert_eq!(parsed, Ok(42));
    }

    #[test]
    fn test_sticky_backend() {
        let primary = MemorySecretStore::new("primary").with_available(false);
        let secondary = MemorySecretStore::new("secondary");

        let first = SecureStorage::create_with("app", boxed(&[&primary, &secondary]), 256).unwrap();
        assert_eq!(first.backend_name(), "secondary");
        let encrypted = first.encrypt_bytes(&ByteSecret::wrap(TOKEN.to_vec())).unwrap();

        primary.set_available(true);
        let second =
            SecureStorage::create_with("app", boxed(&[&primary, &secondary]), 256).unwrap();
        assert_eq!(second.backend_name(), "secondary");
        second.decrypt_bytes(&encrypted, |p| assert_eq!(p, TOKEN)).unwrap();

        // A different id has no secret yet and takes the first available store.
        let other =
            SecureStorage::create_with("other", boxed(&[&primary, &secondary]), 256).unwrap();
        assert_eq!(other.backend_name(), "primary");
    }

    #[test]
    fn test_no_backend_available() {
        let store = MemorySecretStore::default().with_available(false);
        assert!(matches!(
            SecureStorage::create_with("app", boxed(&[&store]), 256),
            Err(SecretError::NoBackendAvailable)
        ));
        assert!(matches!(
            SecureStorage::create_with("app", Vec::new(), 256),
            Err(SecretError::NoBackendAvailable)
        ));
    }

    #[test]
    fn test_invalid_id() {
        let store = MemorySecretStore::default();
        assert!(matches!(
            SecureStorage::create_with("../app", boxed(&[&store]), 256),
            Err(SecretError::InvalidId(_))
        ));
    }

    #[test]
    fn test_key_length_cap() {
        let store = MemorySecretStore::default();
        let storage = SecureStorage::create_with("app", boxed(&[&store]), 128).unwrap();
        assert_eq!(storage.coder_id(), CoderId::Aes128);

        storage.encrypt_bytes(&ByteSecret::wrap(vec![1])).unwrap();
        store
            .get_secret("app")
            .unwrap()
            .unwrap()
            .with_value(|s| assert_eq!(s.len(), 4 + 8 + 16));
    }

    #[test]
    fn test_existing_secret_keeps_its_coder() {
        let store = MemorySecretStore::default();
        let wide = SecureStorage::create_with("app", boxed(&[&store]), 256).unwrap();
        let encrypted = wide.encrypt_bytes(&ByteSecret::wrap(TOKEN.to_vec())).unwrap();

        let capped = SecureStorage::create_with("app", boxed(&[&store]), 128).unwrap();
        capped.decrypt_bytes(&encrypted, |p| assert_eq!(p, TOKEN)).unwrap();
    }

    #[test]
    fn test_corrupt_master_secret() {
        let store = MemorySecretStore::default();
        store.set_secret("app", &[7, 0, 0, 0]).unwrap();
        let storage = memory_storage(&store);
        assert!(matches!(
            storage.encrypt_bytes(&ByteSecret::wrap(vec![1])),
            Err(SecretError::Format(_))
        ));
    }

    #[test]
    fn test_file_backed_storage() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.secrets_dir = Some(dir.path().join("secrets"));
        config.storage.keychain = false;
        config.storage.credential_manager = false;

        let storage = SecureStorage::create_with_config("app.token", &config).unwrap();
        assert_eq!(storage.backend_name(), "file");
        assert_eq!(storage.to_string(), "SecureStorage[file:app.token]");

        let encrypted = storage.encrypt_bytes(&ByteSecret::wrap(TOKEN.to_vec())).unwrap();
        let store = FileSecretStore::new(dir.path().join("secrets"));
        assert!(store.has_secret("app.token").unwrap());

        let reopened = SecureStorage::create_with_config("app.token", &config).unwrap();
        reopened
            .decrypt_bytes(&encrypted, |p| assert_eq!(p, TOKEN))
            .unwrap();

        reopened.delete().unwrap();
        assert!(!store.has_secret("app.token").unwrap());
    }

    #[test]
    fn test_display_and_debug() {
        let store = MemorySecretStore::new("vault");
        let storage = SecureStorage::create_with("app", boxed(&[&store]), 256).unwrap();
        assert_eq!(storage.to_string(), "SecureStorage[vault:app]");
        let debug = format!("{storage:?}");
        assert!(debug.contains("vault"));
        assert!(debug.contains("Aes256"));
    }
}
