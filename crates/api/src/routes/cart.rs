//! Cart route handlers.
//!
//! The cart is stored per user in the database, so it follows the account
//! across devices. Mutations return the updated cart.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use tracing::instrument;

use craftly_core::ProductId;
use craftly_core::validation::validate_quantity;

use crate::db::CartRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::state::AppState;

/// Build the cart router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show).delete(clear))
        .route("/items", post(add))
        .route("/items/{product_id}", put(set_quantity).delete(remove))
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Set-quantity request body.
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

/// The logged-in user's cart.
///
/// GET /api/cart
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool()).get(user.id).await?;
    Ok(Json(cart))
}

/// Add a product, incrementing the line if it is already in the cart.
///
/// POST /api/cart/items
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<Cart>> {
    validate_quantity(req.quantity)?;

    let cart = CartRepository::new(state.pool())
        .add(user.id, req.product_id, req.quantity)
        .await?;
    Ok(Json(cart))
}

/// Set a line's quantity. Zero removes the line.
///
/// PUT /api/cart/items/{product_id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn set_quantity(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<i32>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<Cart>> {
    if req.quantity > 0 {
        validate_quantity(req.quantity)?;
    }

    let cart = CartRepository::new(state.pool())
        .set_quantity(user.id, ProductId::new(product_id), req.quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove a line.
///
/// DELETE /api/cart/items/{product_id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<i32>,
) -> Result<Json<Cart>> {
    let carts = CartRepository::new(state.pool());

    if !carts.remove(user.id, ProductId::new(product_id)).await? {
        return Err(AppError::NotFound(format!(
            "product {product_id} is not in the cart"
        )));
    }
    Ok(Json(carts.get(user.id).await?))
}

/// Empty the cart.
///
/// DELETE /api/cart
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn clear(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<StatusCode> {
    CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
