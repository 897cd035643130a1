//! Product detail route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use ridgeline_core::ProductId;

use crate::db::{ProductRepository, images};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::{DEFAULT_IMAGE_URL, Product, ProductImage};
use crate::state::AppState;

/// Product detail display data for templates.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: i32,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            stock: product.stock,
        }
    }
}

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
}

impl From<&ProductImage> for ImageView {
    fn from(image: &ProductImage) -> Self {
        Self {
            url: image.url.clone(),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
    pub images: Vec<ImageView>,
}

/// Display a product with its image carousel.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ProductShowTemplate> {
    let product_id = ProductId::new(id);

    let product = ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let mut images: Vec<ImageView> = images::list_for_product(state.pool(), product_id)
        .await?
        .iter()
        .map(ImageView::from)
        .collect();

    if images.is_empty() {
        images.push(ImageView {
            url: DEFAULT_IMAGE_URL.to_string(),
        });
    }

    Ok(ProductShowTemplate {
        product: ProductDetailView::from(&product),
        images,
    })
}
