//! Checkout route handlers.
//!
//! Checkout is a stub: the form collects contact details, the POST clears
//! the session cart and thanks the shopper. No order row is written and no
//! payment is taken.

use askama::Template;
use askama_web::WebTemplate;
use axum::Form;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::session_keys;

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub address: String,
}

/// Checkout form template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutShowTemplate;

/// Order-placed template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/thanks.html")]
pub struct CheckoutThanksTemplate;

/// Display the checkout form.
#[instrument]
pub async fn show() -> CheckoutShowTemplate {
    CheckoutShowTemplate
}

/// Place the order: clear the cart and thank the shopper.
#[instrument(skip_all)]
pub async fn place_order(
    session: Session,
    Form(_form): Form<CheckoutForm>,
) -> Result<CheckoutThanksTemplate> {
    if let Err(e) = session.remove::<serde_json::Value>(session_keys::CART).await {
        tracing::warn!("Failed to clear cart from session: {e}");
    }
    tracing::info!("Checkout completed, cart cleared");

    Ok(CheckoutThanksTemplate)
}
