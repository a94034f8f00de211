//! End-to-end tests of `SecureStorage` over real file-backed master secrets.

use sealkeep_integration_tests::file_only_config;
use sealkeep_secrets::{
    ByteSecret, CharSecret, CoderId, FileSecretStore, MemorySecretStore, SecretError,
    SecretStore, SecureStorage, SensitiveValue, StorableCoder,
};
use tempfile::TempDir;

const TOKEN: &[u8] = b"AVerySecretPassword4Testing";

#[test]
fn test_encrypt_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config = file_only_config(&dir);

    let encrypted = {
        let storage = SecureStorage::create_with_config("app.token", &config).unwrap();
        storage.encrypt_bytes(&ByteSecret::wrap(TOKEN.to_vec())).unwrap()
    };
    assert_eq!(encrypted.len(), 12 + TOKEN.len() + 16);

    let storage = SecureStorage::create_with_config("app.token", &config).unwrap();
    storage
        .decrypt_bytes(&encrypted, |plain| assert_eq!(plain, TOKEN))
        .unwrap();
}

#[test]
fn test_master_secret_file_layout() {
    let dir = TempDir::new().unwrap();
    let config = file_only_config(&dir);

    let storage = SecureStorage::create_with_config("layout", &config).unwrap();
    storage.encrypt_bytes(&ByteSecret::wrap(vec![0])).unwrap();

    let blob = std::fs::read(dir.path().join("secrets").join("layout.secret")).unwrap();
    assert_eq!(blob.len(), 4 + 8 + 32);
    assert_eq!(&blob[..4], &CoderId::Aes256.ordinal().to_le_bytes());

    // The stored blob reloads as a coder that decrypts storage output.
    let coder = StorableCoder::load(&ByteSecret::wrap(blob)).unwrap();
    assert_eq!(coder.id(), CoderId::Aes256);
    let encrypted = storage.encrypt_bytes(&ByteSecret::wrap(TOKEN.to_vec())).unwrap();
    coder
        .decrypt(&encrypted)
        .unwrap()
        .with_value(|plain| assert_eq!(plain.as_slice(), TOKEN));
}

#[test]
fn test_capped_key_length() {
    let dir = TempDir::new().unwrap();
    let mut config = file_only_config(&dir);
    config.crypto.max_key_bits = 128;

    let storage = SecureStorage::create_with_config("capped", &config).unwrap();
    storage.encrypt_bytes(&ByteSecret::wrap(vec![0])).unwrap();

    let blob = std::fs::read(dir.path().join("secrets").join("capped.secret")).unwrap();
    assert_eq!(blob.len(), 4 + 8 + 16);
    assert_eq!(&blob[..4], &[0, 0, 0, 0]);
}

#[test]
fn test_delete_then_recreate_cannot_decrypt() {
    let dir = TempDir::new().unwrap();
    let config = file_only_config(&dir);

    let storage = SecureStorage::create_with_config("app", &config).unwrap();
    let encrypted = storage.encrypt_bytes(&ByteSecret::wrap(TOKEN.to_vec())).unwrap();
    storage.delete().unwrap();

    let recreated = SecureStorage::create_with_config("app", &config).unwrap();
    let result = recreated.decrypt_bytes(&encrypted, |plain| plain.to_vec());
    assert!(matches!(result, Err(SecretError::Decryption)));
}

#[test]
fn test_ids_are_isolated() {
    let dir = TempDir::new().unwrap();
    let config = file_only_config(&dir);

    let alice = SecureStorage::create_with_config("alice", &config).unwrap();
    let bob = SecureStorage::create_with_config("bob", &config).unwrap();

    let encrypted = alice.encrypt_bytes(&ByteSecret::wrap(TOKEN.to_vec())).unwrap();
    assert!(matches!(
        bob.decrypt_bytes(&encrypted, |_| ()),
        Err(SecretError::Decryption)
    ));
}

#[test]
fn test_password_round_trip_wipes_caller_buffer() {
    let dir = TempDir::new().unwrap();
    let config = file_only_config(&dir);
    let storage = SecureStorage::create_with_config("login", &config).unwrap();

    let mut password: Vec<u16> = "correct horse".encode_utf16().collect();
    let secret = SensitiveValue::wrap(password.as_mut_slice());
    let encoded = storage.encrypt_chars_base64(&secret).unwrap();
    secret.dispose();
    assert!(password.iter().all(|c| *c == 0));

    let decoded = storage
        .decrypt_chars_base64(&encoded, String::from_utf16_lossy)
        .unwrap();
    assert_eq!(decoded, "correct horse");
}

#[test]
fn test_existing_secret_pins_backend() {
    let dir = TempDir::new().unwrap();
    let preferred = MemorySecretStore::new("vault").with_available(false);
    let file = FileSecretStore::new(dir.path().join("secrets"));

    let stores = |preferred: &MemorySecretStore| -> Vec<Box<dyn SecretStore>> {
        vec![Box::new(preferred.clone()), Box::new(file.clone())]
    };

    let first = SecureStorage::create_with("app", stores(&preferred), 256).unwrap();
    assert_eq!(first.backend_name(), "file");
    let encrypted = first
        .encrypt_chars(&CharSecret::from("pinned"))
        .unwrap();

    // The vault comes online later but holds nothing for this id.
    preferred.set_available(true);
    let second = SecureStorage::create_with("app", stores(&preferred), 256).unwrap();
    assert_eq!(second.to_string(), "SecureStorage[file:app]");
    let plain = second
        .decrypt_chars(&encrypted, String::from_utf16_lossy)
        .unwrap();
    assert_eq!(plain, "pinned");
    assert!(preferred.is_empty());
}

#[test]
fn test_no_backend_available() {
    let off = MemorySecretStore::default().with_available(false);
    let stores: Vec<Box<dyn SecretStore>> = vec![Box::new(off)];
    let result = SecureStorage::create_with("app", stores, 256);
    assert!(matches!(result, Err(SecretError::NoBackendAvailable)));
}
