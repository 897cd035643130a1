//! Category repository for database operations.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::Category;

/// Categories seeded on first admin use when the table is empty.
const DEFAULT_CATEGORIES: &[&str] = &["Trail Gear", "Camp Kitchen", "Optics", "Misc."];

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, description
            FROM categories
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// List categories, seeding the default set first if the table is empty.
    ///
    /// The admin product form needs at least one category to offer; a fresh
    /// database gets the default set on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_or_seed_defaults(&self) -> Result<Vec<Category>, RepositoryError> {
        let existing = self.list().await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let mut tx = self.pool.begin().await?;
        for name in DEFAULT_CATEGORIES {
            sqlx::query("INSERT INTO categories (name) VALUES ($1)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        self.list().await
    }
}
