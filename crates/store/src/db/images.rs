//! Database operations for product images.
//!
//! Besides the admin-facing reads and writes, this module carries the two
//! queries the nightly cleanup sweep is built on: listing every
//! primary-flagged row and demoting a batch of image ids in one statement.

use ridgeline_core::{ImageId, ProductId};
use sqlx::{PgPool, Postgres, Transaction};

use super::RepositoryError;
use crate::models::ProductImage;

/// A primary-flagged image row, as consumed by the cleanup sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct PrimaryImageRow {
    /// The image carrying the primary flag.
    pub image_id: ImageId,
    /// The product that owns it.
    pub product_id: ProductId,
}

/// List all images for a product, oldest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_product(
    pool: &PgPool,
    product_id: ProductId,
) -> Result<Vec<ProductImage>, RepositoryError> {
    let images = sqlx::query_as::<_, ProductImage>(
        r"
        SELECT id, product_id, url, is_primary
        FROM product_images
        WHERE product_id = $1
        ORDER BY id
        ",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(images)
}

/// Find the primary image for a product, if any.
///
/// When duplicates exist (transient invariant violation), the oldest wins,
/// matching the cleanup sweep's tie-break.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_primary(
    pool: &PgPool,
    product_id: ProductId,
) -> Result<Option<ProductImage>, RepositoryError> {
    let image = sqlx::query_as::<_, ProductImage>(
        r"
        SELECT id, product_id, url, is_primary
        FROM product_images
        WHERE product_id = $1 AND is_primary
        ORDER BY id
        LIMIT 1
        ",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(image)
}

/// Find an image by its URL.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_url(
    pool: &PgPool,
    url: &str,
) -> Result<Option<ProductImage>, RepositoryError> {
    let image = sqlx::query_as::<_, ProductImage>(
        r"
        SELECT id, product_id, url, is_primary
        FROM product_images
        WHERE url = $1
        LIMIT 1
        ",
    )
    .bind(url)
    .fetch_optional(pool)
    .await?;

    Ok(image)
}

/// Insert an image row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(
    pool: &PgPool,
    product_id: ProductId,
    url: &str,
    is_primary: bool,
) -> Result<ProductImage, RepositoryError> {
    let image = sqlx::query_as::<_, ProductImage>(
        r"
        INSERT INTO product_images (product_id, url, is_primary)
        VALUES ($1, $2, $3)
        RETURNING id, product_id, url, is_primary
        ",
    )
    .bind(product_id)
    .bind(url)
    .bind(is_primary)
    .fetch_one(pool)
    .await?;

    Ok(image)
}

/// Make `url` the sole primary image for a product, inside the caller's
/// transaction.
///
/// Demotes every currently-primary image for the product, then promotes an
/// existing row with the same URL or inserts a new primary row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn set_primary(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    url: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE product_images
        SET is_primary = FALSE
        WHERE product_id = $1 AND is_primary
        ",
    )
    .bind(product_id)
    .execute(&mut **tx)
    .await?;

    let promoted = sqlx::query(
        r"
        UPDATE product_images
        SET is_primary = TRUE
        WHERE product_id = $1 AND url = $2
        ",
    )
    .bind(product_id)
    .bind(url)
    .execute(&mut **tx)
    .await?;

    if promoted.rows_affected() == 0 {
        sqlx::query(
            r"
            INSERT INTO product_images (product_id, url, is_primary)
            VALUES ($1, $2, TRUE)
            ",
        )
        .bind(product_id)
        .bind(url)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// List every primary-flagged image row across the catalog.
///
/// Ordered by product id then image id so sweep output is deterministic.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_primary_flagged(pool: &PgPool) -> Result<Vec<PrimaryImageRow>, RepositoryError> {
    let rows = sqlx::query_as::<_, PrimaryImageRow>(
        r"
        SELECT id AS image_id, product_id
        FROM product_images
        WHERE is_primary
        ORDER BY product_id, id
        ",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Clear the primary flag on a batch of images in a single statement.
///
/// One `UPDATE ... WHERE id = ANY($1)` so the whole batch commits or fails
/// together. Returns the number of rows updated.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn demote(pool: &PgPool, image_ids: &[ImageId]) -> Result<u64, RepositoryError> {
    if image_ids.is_empty() {
        return Ok(0);
    }

    let ids: Vec<i32> = image_ids.iter().map(ImageId::as_i32).collect();
    let result = sqlx::query(
        r"
        UPDATE product_images
        SET is_primary = FALSE
        WHERE id = ANY($1)
        ",
    )
    .bind(&ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
