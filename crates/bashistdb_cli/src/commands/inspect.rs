//! Store inspection commands. These always work on the local store.

use crate::context::Context;
use bashistdb_store::migration::MigrationManager;
use bashistdb_store::{ConnectionEntry, CURRENT_VERSION};
use clap::ValueEnum;
use std::error::Error;

/// Output format of the `connections` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConnectionsFormat {
    /// One line per connection
    Text,
    /// Pretty-printed JSON array
    Json,
}

/// Prints the connection log.
pub fn connections(ctx: &Context, format: ConnectionsFormat) -> Result<(), Box<dyn Error>> {
    let entries = ctx.open_store()?.connections()?;
    match format {
        ConnectionsFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        ConnectionsFormat::Text => {
            for entry in &entries {
                println!("{}", format_entry(entry));
            }
        }
    }
    Ok(())
}

fn format_entry(entry: &ConnectionEntry) -> String {
    format!(
        "{} {} {}",
        entry.datetime.format("%Y-%m-%d %H:%M:%S UTC"),
        entry.remote,
        entry.reverse.as_deref().unwrap_or("-")
    )
}

/// Prints the schema version and known migrations.
pub fn schema(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let store = ctx.open_store()?;

    println!("Store Schema");
    println!("============");
    println!("  Path:    {}", store.config().path.display());
    println!("  Version: {} (current {})", store.schema_version()?, CURRENT_VERSION);

    let migrations = MigrationManager::with_builtin().list();
    println!("\nMigrations:");
    for m in &migrations {
        println!("  v{} -> v{}: {}", m.from, m.to, m.name);
    }
    Ok(())
}
