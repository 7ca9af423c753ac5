//! Session-backed cart handlers.
//!
//! The serialized cart lives in the session under the cart storage key. Each
//! request loads it into a `MemoryCartStorage`, runs one `CartStore`
//! operation and writes the payload back.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    routing::{get, patch, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use stern_core::cart::{CartLine, CartStore, MemoryCartStorage};
use stern_core::{ProductId, format_money};

use crate::db::CatalogRepository;
use crate::error::AppError;
use crate::models::session_keys;
use crate::state::AppState;

type SessionCart = CartStore<MemoryCartStorage>;

/// Build the cart router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(show).delete(clear))
        .route("/api/cart/items", post(add))
        .route(
            "/api/cart/items/{product_id}",
            patch(update_quantity).delete(remove),
        )
}

/// Body of `POST /api/cart/items`. A missing quantity counts as 1.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemInput {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

/// Body of `PATCH /api/cart/items/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityInput {
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// Cart contents with totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
    pub item_count: i64,
    pub subtotal_label: String,
}

impl CartView {
    fn new(cart: &SessionCart) -> Self {
        let subtotal = cart.subtotal();
        Self {
            items: cart.read(),
            subtotal,
            item_count: cart.item_count(),
            subtotal_label: format_money(subtotal),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_cart(session: &Session) -> Result<SessionCart, AppError> {
    let payload: Option<String> = session.get(session_keys::CART).await?;
    let storage = payload.map_or_else(MemoryCartStorage::new, MemoryCartStorage::with_payload);
    Ok(CartStore::new(storage))
}

async fn store_cart(session: &Session, cart: SessionCart) -> Result<CartView, AppError> {
    let view = CartView::new(&cart);
    if let Some(payload) = cart.into_storage().into_payload() {
        session.insert(session_keys::CART, payload).await?;
    }
    Ok(view)
}

// =============================================================================
// Handlers
// =============================================================================

/// Current cart.
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn show(session: Session) -> Result<Json<CartView>, AppError> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::new(&cart)))
}

/// Add a product, merging with an existing line and capping at stock.
///
/// # Errors
///
/// Returns 404 if the product is missing or inactive.
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<AddItemInput>, JsonRejection>,
) -> Result<Json<CartView>, AppError> {
    let Json(input) = payload?;
    let product = CatalogRepository::new(state.pool())
        .get_product(input.product_id)
        .await?;

    let mut cart = load_cart(&session).await?;
    cart.add(&product.to_cart_product(), input.quantity);
    Ok(Json(store_cart(&session, cart).await?))
}

/// Set the quantity of a line. Unknown products leave the cart unchanged.
///
/// # Errors
///
/// Returns 400 for a malformed body.
pub async fn update_quantity(
    session: Session,
    path: Result<Path<ProductId>, PathRejection>,
    payload: Result<Json<UpdateQuantityInput>, JsonRejection>,
) -> Result<Json<CartView>, AppError> {
    let Path(product_id) = path?;
    let Json(input) = payload?;
    let mut cart = load_cart(&session).await?;
    cart.update_quantity(product_id, input.quantity);
    Ok(Json(store_cart(&session, cart).await?))
}

/// Remove a line.
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn remove(
    session: Session,
    path: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<CartView>, AppError> {
    let Path(product_id) = path?;
    let mut cart = load_cart(&session).await?;
    cart.remove(product_id);
    Ok(Json(store_cart(&session, cart).await?))
}

/// Empty the cart.
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn clear(session: Session) -> Result<Json<CartView>, AppError> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    Ok(Json(store_cart(&session, cart).await?))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use stern_core::cart::CartProduct;

    use super::*;

    #[test]
    fn test_cart_view_totals() {
        let mut cart = CartStore::new(MemoryCartStorage::new());
        cart.add(
            &CartProduct {
                product_id: ProductId::new(1),
                name: "Tenis Runner".into(),
                category: Some("Tenis".into()),
                price: dec!(1299.50),
                stock: Some(10),
                image_url: None,
            },
            2,
        );

        let view = CartView::new(&cart);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, dec!(2599.00));
        assert_eq!(view.subtotal_label, format_money(dec!(2599.00)));
    }

    #[test]
    fn test_add_item_quantity_defaults_to_one() {
        let input: AddItemInput = serde_json::from_str(r#"{"productId": "4"}"#).unwrap();
        assert_eq!(input.product_id, ProductId::new(4));
        assert_eq!(input.quantity, 1);
    }
}
