//! `sealkeep decrypt`

use std::io::Write;

use anyhow::Context;
use clap::Args;
use sealkeep_core::Config;
use sealkeep_secrets::SecureStorage;
use zeroize::Zeroizing;

/// Decrypt command arguments.
#[derive(Args)]
pub struct DecryptArgs {
    /// Secret id the value was encrypted under
    #[arg(long)]
    pub id: String,

    /// Decode the plaintext as UTF-16 characters
    #[arg(long)]
    pub chars: bool,

    /// Base64 ciphertext produced by `sealkeep encrypt`
    pub ciphertext: String,
}

/// Run the decrypt command, printing the plaintext.
pub fn run(args: DecryptArgs, config: &Config) -> anyhow::Result<()> {
    let plain = decrypt(&args.id, &args.ciphertext, args.chars, config)?;
    let mut out = std::io::stdout().lock();
    out.write_all(plain.as_bytes())?;
    writeln!(out)?;
    Ok(())
}

/// Decrypt base64 `ciphertext` for `id` into text.
///
/// Bytes that are not valid UTF-8 (or UTF-16 in char mode) are replaced.
pub fn decrypt(
    id: &str,
    ciphertext: &str,
    chars: bool,
    config: &Config,
) -> anyhow::Result<Zeroizing<String>> {
    let storage = SecureStorage::create_with_config(id, config)
        .with_context(|| format!("Failed to open secure storage for '{id}'"))?;

    let plain = if chars {
        storage.decrypt_chars_base64(ciphertext, |c| {
            Zeroizing::new(String::from_utf16_lossy(c))
        })?
    } else {
        storage.decrypt_bytes_base64(ciphertext, |p| {
            Zeroizing::new(String::from_utf8_lossy(p).into_owned())
        })?
    };
    Ok(plain)
}
