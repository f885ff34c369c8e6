//! Profile route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use tracing::instrument;

use craftly_core::{ShippingAddress, UserId};

use crate::db::ProfileRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Profile, ProfileUpdate, PublicProfile};
use crate::state::AppState;

/// Build the profile router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show).put(update))
        .route("/address", put(set_address))
        .route("/{user_id}", get(public))
}

/// The caller's profile with email and roles.
///
/// GET /api/profile
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    let profile = ProfileRepository::new(state.pool())
        .get(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_string()))?;
    Ok(Json(profile))
}

/// Partially update the caller's profile. Absent fields are left alone.
///
/// PUT /api/profile
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    update.validate()?;
    let profile = ProfileRepository::new(state.pool())
        .update(user.id, &update)
        .await?;
    Ok(Json(profile))
}

/// Set the address checkout pre-fills.
///
/// PUT /api/profile/address
#[instrument(skip(state, user, address), fields(user_id = %user.id))]
async fn set_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(address): Json<ShippingAddress>,
) -> Result<Json<Profile>> {
    address.validate()?;
    let profile = ProfileRepository::new(state.pool())
        .set_default_address(user.id, &address)
        .await?;
    Ok(Json(profile))
}

/// What other users see about someone (sellers, chat partners).
///
/// GET /api/profile/{user_id}
#[instrument(skip(state))]
async fn public(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<PublicProfile>> {
    let profile = ProfileRepository::new(state.pool())
        .get_public(UserId::new(user_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
    Ok(Json(profile))
}
