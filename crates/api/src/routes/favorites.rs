//! Favorite route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use tracing::instrument;

use craftly_core::ProductId;

use crate::db::FavoriteRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::FavoriteItem;
use crate::state::AppState;

/// Build the favorites router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{product_id}", get(status).post(add).delete(remove))
}

/// Whether a product is in the user's favorites.
#[derive(Debug, Serialize)]
pub struct FavoriteStatus {
    pub favorite: bool,
}

/// The user's favorites, newest first.
///
/// GET /api/favorites
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<FavoriteItem>>> {
    Ok(Json(FavoriteRepository::new(state.pool()).list(user.id).await?))
}

/// Favorite a product. Adding twice is not an error.
///
/// POST /api/favorites/{product_id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<i32>,
) -> Result<StatusCode> {
    FavoriteRepository::new(state.pool())
        .add(user.id, ProductId::new(product_id))
        .await?;
    Ok(StatusCode::CREATED)
}

/// Unfavorite a product.
///
/// DELETE /api/favorites/{product_id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<i32>,
) -> Result<StatusCode> {
    FavoriteRepository::new(state.pool())
        .remove(user.id, ProductId::new(product_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/favorites/{product_id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<i32>,
) -> Result<Json<FavoriteStatus>> {
    let favorite = FavoriteRepository::new(state.pool())
        .contains(user.id, ProductId::new(product_id))
        .await?;
    Ok(Json(FavoriteStatus { favorite }))
}
