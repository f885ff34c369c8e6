//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The session
//! table (`tower_sessions.session`) is created by migration. The cookie is
//! signed with the key derived from `CRAFTLY_SESSION_SECRET`; a cookie whose
//! signature doesn't verify is treated as no session at all.

use sqlx::PgPool;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ApiConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "craftly_session";

/// Session expiry time in seconds (30 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// # Arguments
///
/// * `pool` - `PostgreSQL` connection pool
/// * `config` - API configuration (signing key, secure cookies over HTTPS)
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &ApiConfig,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(config.session_key.key())
}
