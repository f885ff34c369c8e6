//! Authentication route handlers.
//!
//! Registration, login and logout against the local user table. The
//! logged-in identity lives in the `PostgreSQL`-backed session.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use craftly_core::{Email, Role, UserId};

use crate::config::RateLimit;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    RequireAuth, auth_rate_limiter, clear_current_user, refresh_current_user, set_current_user,
};
use crate::models::{CurrentUser, User};
use crate::services::AuthService;
use crate::state::AppState;

/// Build the auth router.
///
/// Login, registration and password changes sit behind the strict rate
/// limiter.
pub fn router(limit: RateLimit) -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/password", post(change_password))
        .layer(auth_rate_limiter(limit));

    Router::new()
        .merge(limited)
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/become-seller", post(become_seller))
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change request body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// The account as returned to its owner.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: Email,
    pub display_name: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            roles: user.roles,
            created_at: user.created_at,
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Create an account and log it in.
///
/// POST /api/auth/register
#[instrument(skip(state, session, req), fields(email = %req.email))]
async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let auth = AuthService::new(state.pool());
    let user = auth
        .register(&req.email, &req.password, &req.display_name)
        .await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Log in with email and password.
///
/// POST /api/auth/login
#[instrument(skip(state, session, req), fields(email = %req.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&req.email, &req.password).await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(user.into()))
}

/// End the session.
///
/// POST /api/auth/logout
#[instrument(skip(session))]
async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in account.
///
/// GET /api/auth/me
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserResponse>> {
    let user = AuthService::new(state.pool()).get_user(user.id).await?;
    Ok(Json(user.into()))
}

/// Change the logged-in user's password.
///
/// POST /api/auth/password
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(user.id, &req.current_password, &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Grant the seller role to the logged-in user.
///
/// POST /api/auth/become-seller
///
/// The session copy of the user is refreshed so the new role applies
/// immediately.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
async fn become_seller(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserResponse>> {
    let user = AuthService::new(state.pool()).become_seller(user.id).await?;
    refresh_current_user(&session, &CurrentUser::from(&user)).await?;

    tracing::info!(user_id = %user.id, "User became a seller");
    Ok(Json(user.into()))
}
