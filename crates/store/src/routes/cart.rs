//! Cart route handlers.
//!
//! The cart lives in the shopper's session as a product-id -> quantity map
//! (string keys, since the session serializes to JSON). Totals are computed
//! from current product prices on every render.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use ridgeline_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::session_keys;
use crate::state::AppState;

/// The session cart: product id (stringified) -> quantity.
pub type SessionCart = HashMap<String, u32>;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: i32,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: "$0.00".to_string(),
            item_count: 0,
        }
    }
}

/// Action applied to a cart line.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    Increase,
    Decrease,
    Remove,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub action: CartAction,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart from the session, defaulting to empty.
async fn get_cart(session: &Session) -> SessionCart {
    session
        .get::<SessionCart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the cart in the session.
async fn set_cart(session: &Session, cart: &SessionCart) -> Result<()> {
    session
        .insert(session_keys::CART, cart)
        .await
        .map_err(|e| AppError::Internal(format!("failed to save cart to session: {e}")))
}

/// Apply a cart action to one line. No-op if the product is not in the cart.
///
/// Decrease floors at quantity 1; removal is explicit.
pub fn apply_cart_action(cart: &mut SessionCart, key: &str, action: CartAction) {
    let Some(quantity) = cart.get_mut(key) else {
        return;
    };
    match action {
        CartAction::Increase => *quantity += 1,
        CartAction::Decrease => *quantity = quantity.saturating_sub(1).max(1),
        CartAction::Remove => {
            cart.remove(key);
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Display the cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartShowTemplate> {
    let session_cart = get_cart(&session).await;
    let repo = ProductRepository::new(state.pool());

    // Stable render order: ascending product id.
    let mut entries: Vec<(i32, u32)> = session_cart
        .iter()
        .filter_map(|(key, &quantity)| key.parse::<i32>().ok().map(|id| (id, quantity)))
        .collect();
    entries.sort_unstable();

    let mut items = Vec::new();
    let mut total = Decimal::ZERO;
    let mut item_count = 0;
    for (id, quantity) in entries {
        // Products deleted since the cart was filled are skipped.
        let Some(product) = repo.get(ProductId::new(id)).await? else {
            continue;
        };
        let line_total = product.price.times(quantity);
        total += line_total;
        item_count += quantity;
        items.push(CartItemView {
            product_id: id,
            name: product.name,
            quantity,
            unit_price: product.price.display(),
            line_total: format!("${line_total:.2}"),
        });
    }

    Ok(CartShowTemplate {
        cart: CartView {
            items,
            total: format!("${total:.2}"),
            item_count,
        },
    })
}

/// Add one unit of a product to the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?;
    if product.is_none() {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    let mut cart = get_cart(&session).await;
    *cart.entry(id.to_string()).or_insert(0) += 1;
    set_cart(&session, &cart).await?;

    Ok(Redirect::to("/cart"))
}

/// Change a cart line's quantity or remove it.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let mut cart = get_cart(&session).await;
    apply_cart_action(&mut cart, &id.to_string(), form.action);
    set_cart(&session, &cart).await?;

    Ok(Redirect::to("/cart"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_with(key: &str, quantity: u32) -> SessionCart {
        let mut cart = SessionCart::new();
        cart.insert(key.to_string(), quantity);
        cart
    }

    #[test]
    fn increase_adds_one() {
        let mut cart = cart_with("7", 2);
        apply_cart_action(&mut cart, "7", CartAction::Increase);
        assert_eq!(cart.get("7"), Some(&3));
    }

    #[test]
    fn decrease_floors_at_one() {
        let mut cart = cart_with("7", 1);
        apply_cart_action(&mut cart, "7", CartAction::Decrease);
        assert_eq!(cart.get("7"), Some(&1));

        let mut cart = cart_with("7", 3);
        apply_cart_action(&mut cart, "7", CartAction::Decrease);
        assert_eq!(cart.get("7"), Some(&2));
    }

    #[test]
    fn remove_deletes_the_line() {
        let mut cart = cart_with("7", 2);
        apply_cart_action(&mut cart, "7", CartAction::Remove);
        assert!(cart.is_empty());
    }

    #[test]
    fn unknown_product_is_a_no_op() {
        let mut cart = cart_with("7", 2);
        apply_cart_action(&mut cart, "8", CartAction::Increase);
        assert_eq!(cart, cart_with("7", 2));
    }
}
