//! `sealkeep status`

use clap::Args;
use sealkeep_core::Config;
use sealkeep_secrets::{default_stores, select_store, CoderId, Selection, SecretStore};

/// Status command arguments.
#[derive(Args)]
pub struct StatusArgs {
    /// Secret id to inspect
    #[arg(long)]
    pub id: String,
}

/// One row of the status table.
#[derive(Debug, PartialEq, Eq)]
pub struct StoreStatus {
    pub name: String,
    pub available: bool,
    /// `None` when the store is unavailable.
    pub has_secret: Option<bool>,
}

/// Run the status command.
pub fn run(args: StatusArgs, config: &Config) -> anyhow::Result<()> {
    let stores = default_stores(config)?;
    let rows = inspect(&stores, &args.id)?;

    println!("{:<20} {:<10} SECRET", "STORE", "AVAILABLE");
    println!("{}", "-".repeat(40));
    for row in &rows {
        let has_secret = match row.has_secret {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };
        println!(
            "{:<20} {:<10} {}",
            row.name,
            if row.available { "yes" } else { "no" },
            has_secret
        );
    }
    println!();

    match select_store(&stores, &args.id)? {
        Selection::Preferred(i) => {
            println!("Selected: {} (existing master secret)", stores[i].name())
        }
        Selection::Fallback(i) => println!(
            "Selected: {} (new {} master secret on first use)",
            stores[i].name(),
            CoderId::default_for(config.crypto.max_key_bits)
        ),
        Selection::None => println!("Selected: none (no secret store available)"),
    }
    Ok(())
}

/// Probe every store for `id`.
pub fn inspect<S: SecretStore>(stores: &[S], id: &str) -> anyhow::Result<Vec<StoreStatus>> {
    stores
        .iter()
        .map(|store| -> anyhow::Result<StoreStatus> {
            let available = store.is_available()?;
            let has_secret = if available {
                Some(store.has_secret(id)?)
            } else {
                None
            };
            Ok(StoreStatus {
                name: store.name().to_string(),
                available,
                has_secret,
            })
        })
        .collect()
}
