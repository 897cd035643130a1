//! HTTP route handlers for the store.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - Home page (product catalog)
//! GET  /health                      - Health check
//!
//! # Products
//! GET  /products/{id}               - Product detail with image carousel
//!
//! # Cart (session-backed)
//! GET  /cart                        - Cart page
//! POST /cart/add/{id}               - Add one unit of a product
//! POST /cart/update/{id}            - Increase / decrease / remove a line
//!
//! # Checkout (stub)
//! GET  /checkout                    - Checkout form
//! POST /checkout                    - Clear the cart, thank the shopper
//!
//! # Admin
//! GET  /admin                       - Dashboard (product list)
//! GET  /admin/products/new          - Add-product form
//! POST /admin/products/new          - Create product
//! GET  /admin/products/{id}/edit    - Edit-product form
//! POST /admin/products/{id}/edit    - Update product
//! POST /admin/products/{id}/delete  - Delete product
//! ```

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{id}", post(cart::add))
        .route("/update/{id}", post(cart::update))
}

/// Create all routes for the store.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout stub
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        // Admin panel
        .nest("/admin", admin::routes())
}
