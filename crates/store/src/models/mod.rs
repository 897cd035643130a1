//! Domain models for the store.
//!
//! These mirror the catalog tables the handlers actually read. Orders,
//! addresses, and persisted carts exist in the schema only; the session
//! cart lives in session storage as a product-id -> quantity map.

use chrono::{DateTime, Utc};
use ridgeline_core::{CategoryId, ImageId, Price, ProductId};

/// Session storage keys.
pub mod session_keys {
    /// Session cart: map of product id (stringified) to quantity.
    pub const CART: &str = "cart";
}

/// Fallback image served when a product has no images at all.
pub const DEFAULT_IMAGE_URL: &str = "/static/img/default.svg";

/// A product category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
}

/// A catalog product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Unit price (non-negative).
    pub price: Price,
    /// Units in stock (non-negative).
    pub stock: i32,
    /// Owning category, if assigned.
    pub category_id: Option<CategoryId>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

/// A product listing row with its resolved main image.
///
/// The main image is the primary-flagged image if one exists, otherwise the
/// oldest image, otherwise none (templates fall back to the placeholder).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductListing {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Unit price (non-negative).
    pub price: Price,
    /// Units in stock (non-negative).
    pub stock: i32,
    /// Resolved main image URL, if the product has any images.
    pub main_image_url: Option<String>,
}

impl ProductListing {
    /// Image URL for display, falling back to the store placeholder.
    #[must_use]
    pub fn display_image_url(&self) -> &str {
        self.main_image_url.as_deref().unwrap_or(DEFAULT_IMAGE_URL)
    }
}

/// An image attached to a product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImage {
    /// Unique image ID.
    pub id: ImageId,
    /// Owning product.
    pub product_id: ProductId,
    /// Image URL (absolute, or a `/static/...` path).
    pub url: String,
    /// Whether this is the product's primary image.
    ///
    /// At most one image per product should carry this flag; concurrent
    /// admin edits can violate that transiently, and the nightly cleanup
    /// sweep repairs it.
    pub is_primary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_falls_back_to_placeholder_image() {
        let listing = ProductListing {
            id: ProductId::new(1),
            name: "Trail Stove".to_string(),
            description: "Compact canister stove.".to_string(),
            price: Price::zero(),
            stock: 3,
            main_image_url: None,
        };
        assert_eq!(listing.display_image_url(), DEFAULT_IMAGE_URL);
    }
}
