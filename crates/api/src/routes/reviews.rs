//! Review route handlers.
//!
//! Creating or deleting a review recomputes the product's rating in the same
//! transaction, so listings sorted by rating are invalidated afterwards.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use tracing::instrument;

use craftly_core::{ProductId, ReviewId};

use crate::db::ReviewRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{NewReview, Review};
use crate::state::AppState;

/// Build the reviews router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/product/{product_id}", get(for_product))
        .route("/{id}", delete(destroy))
}

/// Reviews of a product, newest first.
///
/// GET /api/reviews/product/{product_id}
#[instrument(skip(state))]
async fn for_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Json<Vec<Review>>> {
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(ProductId::new(product_id))
        .await?;
    Ok(Json(reviews))
}

/// Review a product. One review per user per product.
///
/// POST /api/reviews
#[instrument(skip(state, user, review), fields(user_id = %user.id, product_id = %review.product_id))]
async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(review): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>)> {
    review.validate()?;

    let created = ReviewRepository::new(state.pool())
        .create(user.id, &review)
        .await?;
    state.catalog().invalidate_all().await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Delete a review. Only its author or an admin may.
///
/// DELETE /api/reviews/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let id = ReviewId::new(id);
    let reviews = ReviewRepository::new(state.pool());

    let review = reviews
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {id}")))?;

    if review.user_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "only the author can delete this review".to_string(),
        ));
    }

    let product_id = reviews.delete(id).await?;
    state.catalog().invalidate_all().await;

    tracing::info!(review_id = %id, product_id = %product_id, "Review deleted");
    Ok(StatusCode::NO_CONTENT)
}
