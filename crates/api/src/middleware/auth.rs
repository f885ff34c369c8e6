//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring an authenticated user (optionally with
//! a role) in route handlers. Rejections are JSON error bodies.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use craftly_core::Role;

use crate::db::users::roles_of;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires the seller role (admins pass too).
///
/// Roles are read from the database on every request.
pub struct RequireSeller(pub CurrentUser);

/// Extractor that requires the admin role.
///
/// Roles are read from the database on every request.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when authentication or a role is required.
#[derive(Debug)]
pub enum AuthRejection {
    /// No logged-in user.
    Unauthorized,
    /// Logged in, but missing the required role.
    Forbidden(Role),
    /// Roles couldn't be loaded.
    Unavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Authentication required" })),
            )
                .into_response(),
            Self::Forbidden(role) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": format!("Requires the {role} role") })),
            )
                .into_response(),
            Self::Unavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

/// Read the logged-in user from the request's session, if any.
async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Check `required` against the roles the database holds now.
///
/// `roles` replaces the session copy. An account with no roles at all has
/// been deleted, since every account keeps `buyer`.
fn authorize(
    mut user: CurrentUser,
    roles: Vec<Role>,
    required: Role,
) -> Result<CurrentUser, AuthRejection> {
    if roles.is_empty() {
        return Err(AuthRejection::Unauthorized);
    }
    user.roles = roles;

    // Admins may act on any listing
    if user.has_role(required) || user.is_admin() {
        Ok(user)
    } else {
        Err(AuthRejection::Forbidden(required))
    }
}

/// Load the session user and authorize `required` against current roles.
///
/// Grants and revocations (e.g. from the CLI) apply on the next request,
/// not the next login. The session copy is refreshed when it's out of date.
async fn require_role(
    parts: &Parts,
    state: &AppState,
    required: Role,
) -> Result<CurrentUser, AuthRejection> {
    let user = current_user(parts)
        .await
        .ok_or(AuthRejection::Unauthorized)?;

    let roles = roles_of(state.pool(), user.id).await.map_err(|e| {
        tracing::error!(user_id = %user.id, error = %e, "Failed to load roles");
        AuthRejection::Unavailable
    })?;

    let stale = user.roles != roles;
    let user = authorize(user, roles, required)?;

    if stale
        && let Some(session) = parts.extensions.get::<Session>()
        && let Err(e) = refresh_current_user(session, &user).await
    {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to refresh session roles");
    }

    Ok(user)
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for RequireSeller
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        require_role(parts, &state, Role::Seller).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        require_role(parts, &state, Role::Admin).await.map(Self)
    }
}

/// Helper to set the current user in the session.
///
/// Cycles the session ID first so a pre-login session ID can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to replace the session user without cycling the ID (role refresh).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn refresh_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to end the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
