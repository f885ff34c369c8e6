//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (web client origins)
//! 5. Security headers
//! 6. Session layer (tower-sessions with `PostgreSQL` store)
//! 7. Rate limiting (governor, per route group)

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, RequireAdmin, RequireAuth, RequireSeller, clear_current_user,
    refresh_current_user, set_current_user,
};
pub use cors::cors_layer;
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
