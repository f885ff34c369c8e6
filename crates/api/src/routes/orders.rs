//! Order route handlers.
//!
//! Checkout turns the caller's cart into a `pending` order in one
//! transaction. Buyers may cancel until the order ships; admins drive the
//! rest of the lifecycle.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use tracing::instrument;

use craftly_core::{OrderId, OrderStatus, ShippingAddress};

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{RequireAdmin, RequireAuth, RequireSeller};
use crate::models::Order;
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(checkout))
        .route("/sales", get(sales))
        .route("/{id}", get(show))
        .route("/{id}/cancel", post(cancel))
        .route("/{id}/status", put(update_status))
}

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
}

/// Status change request body.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// Place an order for everything in the cart.
///
/// POST /api/orders
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    req.shipping_address.validate()?;

    let order = OrderRepository::new(state.pool())
        .checkout(user.id, &req.shipping_address)
        .await?;

    // Stock changed for every product in the order
    state.catalog().invalidate_all().await;

    let order_id = order.id.to_string();
    add_breadcrumb("order", "Checkout completed", Some(&[("order_id", &order_id)]));
    tracing::info!(order_id = %order.id, items = order.items.len(), "Order placed");

    Ok((StatusCode::CREATED, Json(order)))
}

/// The caller's orders, newest first.
///
/// GET /api/orders
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.pool()).list_for_user(user.id).await?))
}

/// One of the caller's orders. Other users' orders are reported missing.
///
/// GET /api/orders/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(user.id, OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    Ok(Json(order))
}

/// Cancel one of the caller's orders.
///
/// POST /api/orders/{id}/cancel
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .cancel(user.id, OrderId::new(id))
        .await?;
    state.catalog().invalidate_all().await;
    Ok(Json(order))
}

/// Move an order along its lifecycle.
///
/// PUT /api/orders/{id}/status
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id, status = %req.status))]
async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .update_status(OrderId::new(id), req.status)
        .await?;

    if order.status == OrderStatus::Cancelled {
        state.catalog().invalidate_all().await;
    }
    Ok(Json(order))
}

/// Orders containing the caller's products, limited to their own lines.
///
/// GET /api/orders/sales
#[instrument(skip(state, user), fields(seller_id = %user.id))]
async fn sales(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.pool()).list_for_seller(user.id).await?))
}
