//! Seed the database with default categories and demo products.
//!
//! Intended for fresh development databases. The command is safe to re-run:
//! if any products already exist it does nothing.

use rust_decimal::Decimal;
use tracing::info;

use ridgeline_core::Price;
use ridgeline_store::db::products::ProductInput;
use ridgeline_store::db::{self, CategoryRepository, ProductRepository, images};
use ridgeline_store::models::DEFAULT_IMAGE_URL;

use super::database_url;

/// A demo product to insert.
struct DemoProduct {
    name: &'static str,
    description: &'static str,
    price_cents: i64,
    stock: i32,
    extra_images: usize,
}

const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "Switchback Trekking Poles",
        description: "Collapsible carbon poles with cork grips.",
        price_cents: 5999,
        stock: 24,
        extra_images: 2,
    },
    DemoProduct {
        name: "Basin 2P Tent",
        description: "Freestanding two-person tent, 2.1 kg packed.",
        price_cents: 18999,
        stock: 8,
        extra_images: 2,
    },
    DemoProduct {
        name: "Ember Titanium Stove",
        description: "Canister stove, 48 g, piezo ignition.",
        price_cents: 4499,
        stock: 40,
        extra_images: 1,
    },
];

/// Seed default categories and demo products.
///
/// # Errors
///
/// Returns an error if the database URL is missing or a query fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let categories = CategoryRepository::new(&pool).list_or_seed_defaults().await?;
    info!(count = categories.len(), "Categories present");

    let products = ProductRepository::new(&pool);
    if !products.list_all().await?.is_empty() {
        info!("Products already present, skipping demo seed");
        return Ok(());
    }

    let Some(default_category) = categories.first() else {
        return Err("no categories available to seed products into".into());
    };

    let mut inserted = 0;
    for demo in DEMO_PRODUCTS {
        let input = ProductInput {
            name: demo.name.to_string(),
            description: demo.description.to_string(),
            price: Price::new(Decimal::new(demo.price_cents, 2))
                .map_err(|e| format!("demo price for {}: {e}", demo.name))?,
            stock: demo.stock,
            category_id: default_category.id,
        };

        let product = products.create(input, Some(DEFAULT_IMAGE_URL)).await?;
        for _ in 0..demo.extra_images {
            images::insert(&pool, product.id, DEFAULT_IMAGE_URL, false).await?;
        }
        inserted += 1;
    }

    info!(inserted, "Demo products seeded");
    Ok(())
}
