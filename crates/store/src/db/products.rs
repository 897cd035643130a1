//! Product repository for database operations.
//!
//! Queries use the runtime sqlx API with `FromRow` models. Writes that touch
//! both `products` and `product_images` run inside a single transaction.

use ridgeline_core::{CategoryId, Price, ProductId};
use sqlx::PgPool;

use super::{RepositoryError, images};
use crate::models::{Product, ProductListing};

/// Validated fields for creating or updating a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    /// Display name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Unit price (non-negative).
    pub price: Price,
    /// Units in stock (non-negative).
    pub stock: i32,
    /// Owning category.
    pub category_id: CategoryId,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products with their resolved main image.
    ///
    /// The main image is the primary-flagged image if one exists, otherwise
    /// the oldest image for the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<ProductListing>, RepositoryError> {
        let products = sqlx::query_as::<_, ProductListing>(
            r"
            SELECT p.id, p.name, p.description, p.price, p.stock,
                   (
                       SELECT i.url
                       FROM product_images i
                       WHERE i.product_id = p.id
                       ORDER BY i.is_primary DESC, i.id
                       LIMIT 1
                   ) AS main_image_url
            FROM products p
            ORDER BY p.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, stock, category_id, created_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Create a product, optionally attaching a primary image.
    ///
    /// The insert and the primary-image write happen in one transaction:
    /// any existing primaries for the product are demoted before the new
    /// image row is inserted as primary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails; nothing is
    /// committed in that case.
    pub async fn create(
        &self,
        input: ProductInput,
        image_url: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(
            r"
            INSERT INTO products (name, description, price, stock, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, price, stock, category_id, created_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.category_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(url) = image_url {
            images::set_primary(&mut tx, product.id, url).await?;
        }

        tx.commit().await?;
        Ok(product)
    }

    /// Update a product's fields, optionally changing its primary image.
    ///
    /// If `image_url` is given, existing primaries are demoted and an image
    /// row with that URL is promoted (or inserted) as the new primary, all
    /// in the same transaction as the field update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update(
        &self,
        id: ProductId,
        input: ProductInput,
        image_url: Option<&str>,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(
            r"
            UPDATE products
            SET name = $2, description = $3, price = $4, stock = $5, category_id = $6
            WHERE id = $1
            RETURNING id, name, description, price, stock, category_id, created_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.category_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(product) = product else {
            return Ok(None);
        };

        if let Some(url) = image_url {
            images::set_primary(&mut tx, product.id, url).await?;
        }

        tx.commit().await?;
        Ok(Some(product))
    }

    /// Delete a product. Its images are removed by the FK cascade.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
