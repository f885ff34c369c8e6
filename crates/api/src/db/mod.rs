//! Database operations for the marketplace `PostgreSQL` schema.
//!
//! # Schema: `craftly`
//!
//! - `user`, `user_role`, `profile` - Accounts, granted roles, public profile
//! - `product` - Seller listings with cached rating aggregates
//! - `cart_item`, `favorite` - Per-user product lists
//! - `order`, `order_item` - Placed orders with price snapshots
//! - `review` - One review per user per product
//! - `notification` - In-app notifications
//! - `conversation`, `conversation_member`, `message` - Two-party chat
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p craftly-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow` row
//! types, so the crate builds without a live database.

pub mod cart;
pub mod conversations;
pub mod favorites;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod reviews;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use conversations::ConversationRepository;
pub use favorites::FavoriteRepository;
pub use notifications::NotificationRepository;
pub use orders::{OrderError, OrderRepository};
pub use products::ProductRepository;
pub use profiles::ProfileRepository;
pub use reviews::ReviewRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict(message)`, anything else to `Database`.
    pub(crate) fn on_unique(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }

    /// Map a foreign key violation (missing parent row) to `NotFound`.
    pub(crate) fn on_missing_parent(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return Self::NotFound;
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
