//! Command implementations and the pieces they share.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use craftly_api::db::RepositoryError;
use craftly_api::services::auth::AuthError;

/// Errors any command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Account error: {0}")]
    Auth(#[from] AuthError),

    #[error("Invalid role: {0}. Valid roles: buyer, seller, admin")]
    InvalidRole(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No user with email: {0}")]
    UserNotFound(String),

    /// Seed file unreadable or invalid.
    #[error("Seed file error: {0}")]
    Seed(String),
}

/// Connect to the marketplace database.
///
/// Reads `CRAFTLY_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("CRAFTLY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("CRAFTLY_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(craftly_api::db::create_pool(&database_url).await?)
}
