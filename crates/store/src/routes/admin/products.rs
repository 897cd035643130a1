//! Admin product CRUD route handlers.
//!
//! The add and edit flows share one form template. Supplying an image URL
//! makes that URL the product's sole primary image: existing primaries are
//! demoted and the row is promoted or inserted inside the same transaction
//! as the product write (see `db::images::set_primary`).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use ridgeline_core::{CategoryId, Price, ProductId};

use crate::db::products::ProductInput;
use crate::db::{CategoryRepository, ProductRepository, images};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::Category;
use crate::state::AppState;

/// Product form data (add and edit).
///
/// Price and stock arrive as strings so invalid input can be reported on the
/// form instead of failing extraction.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category: i32,
    #[serde(default)]
    pub image_url: String,
}

impl ProductForm {
    /// Validate the form into a repository input plus the optional image URL.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first failed check.
    pub fn validate(&self) -> std::result::Result<(ProductInput, Option<String>), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err("Description is required".to_string());
        }

        let amount = self
            .price
            .trim()
            .parse::<Decimal>()
            .map_err(|_| "Price must be a number".to_string())?;
        let price = Price::new(amount).map_err(|_| "Price cannot be negative".to_string())?;

        let stock = self
            .stock
            .trim()
            .parse::<i32>()
            .map_err(|_| "Stock must be a whole number".to_string())?;
        if stock < 0 {
            return Err("Stock cannot be negative".to_string());
        }

        let image_url = Some(self.image_url.trim())
            .filter(|url| !url.is_empty())
            .map(ToString::to_string);

        Ok((
            ProductInput {
                name: name.to_string(),
                description: description.to_string(),
                price,
                stock,
                category_id: CategoryId::new(self.category),
            },
            image_url,
        ))
    }
}

/// Category option for the form's select input.
#[derive(Clone)]
pub struct CategoryOption {
    pub id: i32,
    pub name: String,
}

impl From<&Category> for CategoryOption {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.as_i32(),
            name: category.name.clone(),
        }
    }
}

/// Shared add/edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub title: String,
    pub action: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category: i32,
    pub image_url: String,
    pub categories: Vec<CategoryOption>,
    pub error: Option<String>,
}

impl ProductFormTemplate {
    /// Empty form for the add flow.
    fn empty(categories: Vec<CategoryOption>) -> Self {
        let category = categories.first().map_or(0, |c| c.id);
        Self {
            title: "Add Product".to_string(),
            action: "/admin/products/new".to_string(),
            name: String::new(),
            description: String::new(),
            price: String::new(),
            stock: String::new(),
            category,
            image_url: String::new(),
            categories,
            error: None,
        }
    }

    /// Re-render a submitted form with a validation error.
    fn rerender(
        title: &str,
        action: String,
        form: &ProductForm,
        categories: Vec<CategoryOption>,
        error: String,
    ) -> Self {
        Self {
            title: title.to_string(),
            action,
            name: form.name.clone(),
            description: form.description.clone(),
            price: form.price.clone(),
            stock: form.stock.clone(),
            category: form.category,
            image_url: form.image_url.clone(),
            categories,
            error: Some(error),
        }
    }
}

/// Fetch categories as form options, seeding defaults on an empty table.
async fn category_options(state: &AppState) -> Result<Vec<CategoryOption>> {
    let categories = CategoryRepository::new(state.pool())
        .list_or_seed_defaults()
        .await?;
    Ok(categories.iter().map(CategoryOption::from).collect())
}

/// Add-product form.
#[instrument(skip(state))]
pub async fn new_form(State(state): State<AppState>) -> Result<ProductFormTemplate> {
    let categories = category_options(&state).await?;
    Ok(ProductFormTemplate::empty(categories))
}

/// Create a product from the submitted form.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    match form.validate() {
        Ok((input, image_url)) => {
            let product = ProductRepository::new(state.pool())
                .create(input, image_url.as_deref())
                .await?;
            tracing::info!(product_id = %product.id, "Product created");
            Ok(Redirect::to("/admin?saved=created").into_response())
        }
        Err(message) => {
            let categories = category_options(&state).await?;
            Ok(ProductFormTemplate::rerender(
                "Add Product",
                "/admin/products/new".to_string(),
                &form,
                categories,
                message,
            )
            .into_response())
        }
    }
}

/// Edit-product form, pre-filled with current values.
#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<ProductFormTemplate> {
    let product_id = ProductId::new(id);

    let product = ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let categories = category_options(&state).await?;

    // Pre-fill with the current primary image URL, as the add/edit flow
    // round-trips the primary through this single field.
    let image_url = images::find_primary(state.pool(), product_id)
        .await?
        .map(|image| image.url)
        .unwrap_or_default();

    Ok(ProductFormTemplate {
        title: "Edit Product".to_string(),
        action: format!("/admin/products/{id}/edit"),
        name: product.name,
        description: product.description,
        price: product.price.amount().to_string(),
        stock: product.stock.to_string(),
        category: product.category_id.map_or(0, |c| c.as_i32()),
        image_url,
        categories,
        error: None,
    })
}

/// Update a product from the submitted form.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    match form.validate() {
        Ok((input, image_url)) => {
            let updated = ProductRepository::new(state.pool())
                .update(ProductId::new(id), input, image_url.as_deref())
                .await?;
            if updated.is_none() {
                return Err(AppError::NotFound(format!("product {id}")));
            }
            tracing::info!(product_id = id, "Product updated");
            Ok(Redirect::to("/admin?saved=updated").into_response())
        }
        Err(message) => {
            let categories = category_options(&state).await?;
            Ok(ProductFormTemplate::rerender(
                "Edit Product",
                format!("/admin/products/{id}/edit"),
                &form,
                categories,
                message,
            )
            .into_response())
        }
    }
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Redirect> {
    let deleted = ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?;
    if !deleted {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    tracing::info!(product_id = id, "Product deleted");

    Ok(Redirect::to("/admin?saved=deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> ProductForm {
        ProductForm {
            name: "Ridgeline Trekking Poles".to_string(),
            description: "Collapsible carbon poles.".to_string(),
            price: "59.99".to_string(),
            stock: "12".to_string(),
            category: 1,
            image_url: String::new(),
        }
    }

    #[test]
    fn valid_form_passes() {
        let (input, image_url) = valid_form().validate().unwrap();
        assert_eq!(input.name, "Ridgeline Trekking Poles");
        assert_eq!(input.stock, 12);
        assert_eq!(input.category_id, CategoryId::new(1));
        assert_eq!(image_url, None);
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut form = valid_form();
        form.name = "   ".to_string();
        assert_eq!(form.validate().unwrap_err(), "Name is required");
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut form = valid_form();
        form.price = "-1.00".to_string();
        assert_eq!(form.validate().unwrap_err(), "Price cannot be negative");
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let mut form = valid_form();
        form.price = "free".to_string();
        assert_eq!(form.validate().unwrap_err(), "Price must be a number");
    }

    #[test]
    fn negative_stock_is_rejected() {
        let mut form = valid_form();
        form.stock = "-3".to_string();
        assert_eq!(form.validate().unwrap_err(), "Stock cannot be negative");
    }

    #[test]
    fn image_url_is_trimmed_and_normalized() {
        let mut form = valid_form();
        form.image_url = "  /static/img/poles.jpg  ".to_string();
        let (_, image_url) = form.validate().unwrap();
        assert_eq!(image_url.as_deref(), Some("/static/img/poles.jpg"));

        form.image_url = "   ".to_string();
        let (_, image_url) = form.validate().unwrap();
        assert_eq!(image_url, None);
    }
}
