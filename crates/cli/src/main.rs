//! Catalog Keeper CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply catalog migrations
//! catalog-cli migrate
//!
//! # Load a small sample catalog
//! catalog-cli seed
//!
//! # Protect a record from deletion
//! catalog-cli protect brand 3
//!
//! # Lift the protection again
//! catalog-cli unprotect item_instance 12
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert sample brands, categories, products and instances
//! - `protect` / `unprotect` - Toggle the protected flag on one record

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use catalog_core::EntityKind;

mod commands;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(author, version, about = "Catalog Keeper CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with a sample catalog
    Seed,
    /// Mark a record as protected so it can't be deleted
    Protect {
        /// Record kind (`brand`, `category`, `item`, `item_instance`)
        kind: EntityKind,
        /// Record ID
        id: i32,
    },
    /// Clear the protected flag on a record
    Unprotect {
        /// Record kind (`brand`, `category`, `item`, `item_instance`)
        kind: EntityKind,
        /// Record ID
        id: i32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Protect { kind, id } => commands::protect::run(kind, id, true).await?,
        Commands::Unprotect { kind, id } => commands::protect::run(kind, id, false).await?,
    }
    Ok(())
}
