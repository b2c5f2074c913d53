//! Aurum CLI - catalog maintenance and offline quotes.
//!
//! # Usage
//!
//! ```bash
//! # Check every product in a catalog file
//! aurum-cli catalog validate data/catalog.yaml
//!
//! # Make the second metal option of ring-1 the default
//! aurum-cli catalog set-default-metal data/catalog.yaml --product ring-1 --index 1
//!
//! # Remove the first metal option of ring-1
//! aurum-cli catalog remove-metal data/catalog.yaml --product ring-1 --index 0
//!
//! # Price a cart file with express shipping
//! aurum-cli quote --catalog data/catalog.yaml --cart cart.yaml --shipping express
//! ```
//!
//! # Commands
//!
//! - `catalog` - Validate and edit YAML catalog files
//! - `quote` - Price a cart against a catalog without the storefront

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "aurum-cli")]
#[command(author, version, about = "Aurum CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and edit catalog files
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Price a cart file against a catalog
    Quote {
        /// Catalog YAML file
        #[arg(long)]
        catalog: PathBuf,

        /// Cart YAML file (list of productId, quantity, karat, color, size)
        #[arg(long)]
        cart: PathBuf,

        /// Shipping method (`standard`, `express`, `overnight`)
        #[arg(long, default_value = "standard")]
        shipping: String,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Check every product against the catalog invariants
    Validate {
        /// Catalog YAML file
        file: PathBuf,
    },
    /// Make one metal option the product's sole default
    SetDefaultMetal {
        /// Catalog YAML file
        file: PathBuf,

        /// Product ID
        #[arg(short, long)]
        product: String,

        /// Zero-based index into the product's metal options
        #[arg(short, long)]
        index: usize,
    },
    /// Remove a metal option, reassigning the default if needed
    RemoveMetal {
        /// Catalog YAML file
        file: PathBuf,

        /// Product ID
        #[arg(short, long)]
        product: String,

        /// Zero-based index into the product's metal options
        #[arg(short, long)]
        index: usize,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    use commands::catalog::{self, MetalEdit};

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Validate { file } => catalog::validate(&file).await?,
            CatalogAction::SetDefaultMetal {
                file,
                product,
                index,
            } => catalog::edit_metal(&file, &product, MetalEdit::SetDefault(index)).await?,
            CatalogAction::RemoveMetal {
                file,
                product,
                index,
            } => catalog::edit_metal(&file, &product, MetalEdit::Remove(index)).await?,
        },
        Commands::Quote {
            catalog,
            cart,
            shipping,
        } => commands::quote::run(&catalog, &cart, &shipping).await?,
    }
    Ok(())
}
