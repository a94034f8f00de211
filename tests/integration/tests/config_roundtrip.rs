//! Config save/load roundtrip integration tests.
//!
//! These tests verify that configuration can be serialized, written to disk,
//! and loaded back with identical field values.

use sealkeep_core::config::Config;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sealkeep.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sealkeep.json5");

    let mut config = Config::default();
    config.storage.namespace = "com.example.app".to_string();
    config.storage.keychain = false;
    config.crypto.max_key_bits = 128;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.storage.namespace, "com.example.app");
    assert!(!loaded.storage.keychain);
    assert_eq!(loaded.crypto.max_key_bits, 128);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/sealkeep.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}

#[test]
fn test_config_parse_json5_comments() {
    let config = Config::parse(
        r#"{
            // file-only deployment
            storage: { keychain: false, credential_manager: false },
            crypto: { max_key_bits: 128 },
        }"#,
    )
    .unwrap();
    assert!(config.storage.file);
    assert_eq!(config.crypto.max_key_bits, 128);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_all_backends_disabled_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sealkeep.json5");
    std::fs::write(
        &path,
        "{ storage: { keychain: false, credential_manager: false, file: false } }",
    )
    .unwrap();

    assert!(Config::load_or_default(&path).is_err());
}
