//! CLI command integration tests.
//!
//! These tests drive the command functions behind `sealkeep encrypt`,
//! `decrypt`, and `delete` against a file-only configuration.

use sealkeep_cli::commands::{decrypt, delete, encrypt, status};
use sealkeep_integration_tests::file_only_config;
use sealkeep_secrets::default_stores;
use tempfile::TempDir;

#[test]
fn test_encrypt_decrypt_delete() {
    let dir = TempDir::new().unwrap();
    let config = file_only_config(&dir);

    let encoded = encrypt::encrypt("app", "s3cret", false, &config).unwrap();
    let plain = decrypt::decrypt("app", &encoded, false, &config).unwrap();
    assert_eq!(plain.as_str(), "s3cret");

    assert_eq!(delete::delete("app", &config).unwrap(), "file");
    assert!(decrypt::decrypt("app", &encoded, false, &config).is_err());
}

#[test]
fn test_status_reports_secret() {
    let dir = TempDir::new().unwrap();
    let config = file_only_config(&dir);
    let stores = default_stores(&config).unwrap();

    let before = status::inspect(&stores, "app").unwrap();
    let file = before.iter().find(|row| row.name == "file").unwrap();
    assert_eq!(file.has_secret, Some(false));

    encrypt::encrypt("app", "value", true, &config).unwrap();

    let after = status::inspect(&stores, "app").unwrap();
    let file = after.iter().find(|row| row.name == "file").unwrap();
    assert!(file.available);
    assert_eq!(file.has_secret, Some(true));

    let keychain = after.iter().find(|row| row.name == "keychain").unwrap();
    assert!(!keychain.available);
    assert_eq!(keychain.has_secret, None);
}
