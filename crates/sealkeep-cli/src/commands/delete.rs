//! `sealkeep delete`

use anyhow::Context;
use clap::Args;
use sealkeep_core::Config;
use sealkeep_secrets::SecureStorage;

/// Delete command arguments.
#[derive(Args)]
pub struct DeleteArgs {
    /// Secret id whose master secret is removed
    #[arg(long)]
    pub id: String,
}

/// Run the delete command.
pub fn run(args: DeleteArgs, config: &Config) -> anyhow::Result<()> {
    let backend = delete(&args.id, config)?;
    println!("Master secret for '{}' deleted from {}.", args.id, backend);
    println!("Values encrypted under it can no longer be decrypted.");
    Ok(())
}

/// Delete the master secret for `id`, returning the backend it lived in.
pub fn delete(id: &str, config: &Config) -> anyhow::Result<String> {
    let storage = SecureStorage::create_with_config(id, config)
        .with_context(|| format!("Failed to open secure storage for '{id}'"))?;
    storage.delete()?;
    Ok(storage.backend_name().to_string())
}
