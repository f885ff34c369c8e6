//! Notification route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Serialize;
use tracing::instrument;

use craftly_core::NotificationId;

use crate::db::NotificationRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Notification;
use crate::state::AppState;

/// Build the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/{id}/read", post(mark_read))
        .route("/{id}", delete(destroy))
}

/// An unread counter.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// How many rows a bulk update touched.
#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub updated: u64,
}

/// The caller's notifications, newest first.
///
/// GET /api/notifications
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Notification>>> {
    Ok(Json(NotificationRepository::new(state.pool()).list(user.id).await?))
}

/// GET /api/notifications/unread-count
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn unread_count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CountResponse>> {
    let count = NotificationRepository::new(state.pool())
        .unread_count(user.id)
        .await?;
    Ok(Json(CountResponse { count }))
}

/// POST /api/notifications/{id}/read
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn mark_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let found = NotificationRepository::new(state.pool())
        .mark_read(user.id, NotificationId::new(id))
        .await?;
    if !found {
        return Err(AppError::NotFound(format!("notification {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/notifications/read-all
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn mark_all_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UpdatedResponse>> {
    let updated = NotificationRepository::new(state.pool())
        .mark_all_read(user.id)
        .await?;
    Ok(Json(UpdatedResponse { updated }))
}

/// DELETE /api/notifications/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let found = NotificationRepository::new(state.pool())
        .delete(user.id, NotificationId::new(id))
        .await?;
    if !found {
        return Err(AppError::NotFound(format!("notification {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
