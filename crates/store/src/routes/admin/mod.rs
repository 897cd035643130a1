//! Admin panel route handlers.
//!
//! The panel manages the catalog: a dashboard listing every product and the
//! add / edit / delete flows in [`products`]. Like the rest of the app it
//! renders server-side templates; access control is a deployment concern.

pub mod products;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::filters;
use crate::routes::home::ProductCardView;
use crate::state::AppState;

/// Create the admin panel router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route(
            "/products/new",
            get(products::new_form).post(products::create),
        )
        .route(
            "/products/{id}/edit",
            get(products::edit_form).post(products::update),
        )
        .route("/products/{id}/delete", post(products::delete))
}

/// Dashboard query parameters.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Set by the product CRUD redirects to surface a confirmation notice.
    pub saved: Option<String>,
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub products: Vec<ProductCardView>,
    pub notice: Option<String>,
}

/// Map a `saved=` redirect flag to a human notice.
fn notice_for(saved: Option<&str>) -> Option<String> {
    match saved {
        Some("created") => Some("Product added successfully!".to_string()),
        Some("updated") => Some("Product updated!".to_string()),
        Some("deleted") => Some("Product deleted!".to_string()),
        _ => None,
    }
}

/// Admin dashboard: list all products.
#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<AdminDashboardTemplate> {
    let products = ProductRepository::new(state.pool()).list_all().await?;

    Ok(AdminDashboardTemplate {
        products: products.iter().map(ProductCardView::from).collect(),
        notice: notice_for(query.saved.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_maps_known_flags() {
        assert_eq!(
            notice_for(Some("created")).as_deref(),
            Some("Product added successfully!")
        );
        assert_eq!(notice_for(Some("deleted")).as_deref(), Some("Product deleted!"));
        assert_eq!(notice_for(Some("bogus")), None);
        assert_eq!(notice_for(None), None);
    }
}
