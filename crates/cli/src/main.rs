//! Ridgeline CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ridgeline-cli migrate
//!
//! # Seed default categories and demo products
//! ridgeline-cli seed
//!
//! # Import image files into the catalog
//! ridgeline-cli images load --dir crates/store/static/product_images
//!
//! # Repair duplicate primary-image flags right now
//! ridgeline-cli images repair
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the database with default categories and demo products
//! - `images load` - Bulk-import image files named `<product-id>_<role>.<ext>`
//! - `images repair` - Run the primary-image cleanup sweep immediately

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ridgeline-cli")]
#[command(author, version, about = "Ridgeline Outfitters CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with default categories and demo products
    Seed,
    /// Manage product images
    Images {
        #[command(subcommand)]
        action: ImagesAction,
    },
}

#[derive(Subcommand)]
enum ImagesAction {
    /// Import image files from a directory into the catalog
    Load {
        /// Directory containing `<product-id>_<role>.<ext>` files
        #[arg(short, long, default_value = "crates/store/static/product_images")]
        dir: PathBuf,
    },
    /// Repair duplicate primary-image flags immediately
    Repair,
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
        Commands::Images { action } => match action {
            ImagesAction::Load { dir } => commands::images::load(&dir).await?,
            ImagesAction::Repair => commands::images::repair().await?,
        },
    }
    Ok(())
}
