//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::filters;
use crate::models::ProductListing;
use crate::state::AppState;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: i32,
    pub image_url: String,
}

impl From<&ProductListing> for ProductCardView {
    fn from(listing: &ProductListing) -> Self {
        Self {
            id: listing.id.as_i32(),
            name: listing.name.clone(),
            description: listing.description.clone(),
            price: listing.price.display(),
            stock: listing.stock,
            image_url: listing.display_image_url().to_string(),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub products: Vec<ProductCardView>,
}

/// Display the product catalog.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let products = ProductRepository::new(state.pool()).list_all().await?;

    Ok(HomeTemplate {
        products: products.iter().map(ProductCardView::from).collect(),
    })
}
