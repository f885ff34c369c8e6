//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! craftly-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CRAFTLY_DATABASE_URL` - `PostgreSQL` connection string (or `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/api/migrations/` and are embedded at build
//! time:
//! ```text
//! migrations/
//! ├── 20260301000001_create_craftly_schema.sql
//! └── 20260301000002_create_sessions.sql
//! ```

use super::{CliError, connect};

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
