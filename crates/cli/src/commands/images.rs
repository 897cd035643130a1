//! Product image management commands.
//!
//! `load` bulk-imports image files into the catalog using a filename
//! convention: `<product-id>_<role>.<ext>`, where a role containing `main`
//! marks the primary image (e.g. `3_main.jpg`, `3_side.jpg`). `repair` runs
//! the primary-image cleanup sweep immediately, outside its nightly
//! schedule.

use std::path::Path;

use tracing::{info, warn};

use ridgeline_core::ProductId;
use ridgeline_store::db::{self, ProductRepository, images};
use ridgeline_store::services::{ImageCleanupService, PgImageStore};

use super::database_url;

/// File extensions accepted by `load`.
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Parsed `<product-id>_<role>` filename stem.
struct ParsedName {
    product_id: ProductId,
    is_primary: bool,
}

/// Parse a filename stem of the form `<product-id>_<role>[_more]`.
fn parse_stem(stem: &str) -> Option<ParsedName> {
    let mut parts = stem.split('_');
    let product_id = parts.next()?.parse::<i32>().ok()?;
    let role = parts.next()?;

    Some(ParsedName {
        product_id: ProductId::new(product_id),
        is_primary: role.to_lowercase().contains("main"),
    })
}

/// Import image files from a directory into `product_images`.
///
/// Files already present (by URL) and files for unknown products are
/// skipped with a log line.
///
/// # Errors
///
/// Returns an error if the directory cannot be read, the database URL is
/// missing, or a query fails.
pub async fn load(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    if !dir.is_dir() {
        return Err(format!("not a directory: {}", dir.display()).into());
    }

    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let products = ProductRepository::new(&pool);
    let mut added = 0;
    let mut skipped = 0;

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let Some(parsed) = parse_stem(stem) else {
            warn!(file = %file_name, "Skipping invalid file name");
            skipped += 1;
            continue;
        };

        if products.get(parsed.product_id).await?.is_none() {
            warn!(file = %file_name, product_id = %parsed.product_id, "Skipping image for unknown product");
            skipped += 1;
            continue;
        }

        let url = format!("/static/product_images/{file_name}");

        // Avoid duplicates
        if images::find_by_url(&pool, &url).await?.is_some() {
            info!(file = %file_name, "Already in database");
            skipped += 1;
            continue;
        }

        images::insert(&pool, parsed.product_id, &url, parsed.is_primary).await?;
        added += 1;
    }

    info!(added, skipped, "Image import finished");
    Ok(())
}

/// Run the primary-image cleanup sweep immediately.
///
/// # Errors
///
/// Returns an error if the database URL is missing or the sweep fails.
pub async fn repair() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let cleanup = ImageCleanupService::new(PgImageStore::new(pool));
    let report = cleanup.run_once().await?;

    info!(
        products = report.products_with_duplicates,
        demoted = report.images_demoted,
        "Image repair finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primary_and_secondary_stems() {
        let parsed = parse_stem("3_main").expect("valid stem");
        assert_eq!(parsed.product_id, ProductId::new(3));
        assert!(parsed.is_primary);

        let parsed = parse_stem("12_side").expect("valid stem");
        assert_eq!(parsed.product_id, ProductId::new(12));
        assert!(!parsed.is_primary);
    }

    #[test]
    fn rejects_malformed_stems() {
        assert!(parse_stem("noid").is_none());
        assert!(parse_stem("abc_main").is_none());
        assert!(parse_stem("42").is_none());
    }

    #[test]
    fn role_match_is_case_insensitive() {
        assert!(parse_stem("5_MAIN").expect("valid stem").is_primary);
        assert!(parse_stem("5_Main-angle").expect("valid stem").is_primary);
    }
}
