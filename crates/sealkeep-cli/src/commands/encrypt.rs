//! `sealkeep encrypt`

use anyhow::Context;
use clap::Args;
use sealkeep_core::Config;
use sealkeep_secrets::{ByteSecret, CharSecret, SecureStorage};
use zeroize::Zeroizing;

/// Encrypt command arguments.
#[derive(Args)]
pub struct EncryptArgs {
    /// Secret id (alphanumeric, underscore, hyphen, dot)
    #[arg(long)]
    pub id: String,

    /// Encrypt the value as UTF-16 characters (password mode)
    #[arg(long)]
    pub chars: bool,

    /// Value to encrypt (if omitted, prompts for hidden input)
    #[arg(long)]
    pub value: Option<String>,
}

/// Run the encrypt command, printing base64 ciphertext.
pub fn run(args: EncryptArgs, config: &Config) -> anyhow::Result<()> {
    let value = match &args.value {
        Some(v) => Zeroizing::new(v.clone()),
        None => {
            let prompt = format!("Enter value for '{}': ", args.id);
            Zeroizing::new(rpassword::prompt_password(prompt).context("Failed to read secret")?)
        }
    };

    println!("{}", encrypt(&args.id, &value, args.chars, config)?);
    Ok(())
}

/// Encrypt `value` for `id`, returning base64 ciphertext.
pub fn encrypt(id: &str, value: &str, chars: bool, config: &Config) -> anyhow::Result<String> {
    if value.is_empty() {
        anyhow::bail!("Secret value must not be empty");
    }

    let storage = SecureStorage::create_with_config(id, config)
        .with_context(|| format!("Failed to open secure storage for '{id}'"))?;

    let encoded = if chars {
        storage.encrypt_chars_base64(&CharSecret::from(value))?
    } else {
        storage.encrypt_bytes_base64(&ByteSecret::wrap(value.as_bytes().to_vec()))?
    };
    Ok(encoded)
}
