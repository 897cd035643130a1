//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ridgeline-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STORE_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to `DATABASE_URL`)
//!
//! Migration files live in `crates/store/migrations/`:
//! ```text
//! migrations/
//! ├── 20260801000001_create_categories.sql
//! ├── 20260801000002_create_products.sql
//! ├── 20260801000003_create_product_images.sql
//! └── ...
//! ```

use tracing::info;

use ridgeline_store::db;

use super::database_url;

/// Run the store database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails to apply.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;

    info!("Connecting to store database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running store migrations...");
    sqlx::migrate!("../store/migrations").run(&pool).await?;

    info!("Store migrations complete!");
    Ok(())
}
