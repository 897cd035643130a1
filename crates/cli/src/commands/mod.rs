//! CLI subcommand implementations.

pub mod images;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Database URL from `STORE_DATABASE_URL`, falling back to `DATABASE_URL`.
pub fn database_url() -> Result<SecretString, Box<dyn std::error::Error>> {
    std::env::var("STORE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "STORE_DATABASE_URL not set".into())
}
