//! Seed sellers and their listings from a YAML file.
//!
//! ```yaml
//! sellers:
//!   - email: mira@craftly.test
//!     display_name: Mira Okafor
//!     password: kiln-fired-2026   # only used if the account doesn't exist
//!     products:
//!       - title: Raku tea bowl
//!         category: ceramics
//!         price: "38.00"
//!         stock: 4
//! ```
//!
//! Seeding is repeatable: missing accounts are created, every seller gets
//! the seller role, and products whose title the seller already lists are
//! skipped.

use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};

use craftly_api::db::{ProductRepository, UserRepository};
use craftly_api::models::NewProduct;
use craftly_api::services::AuthService;
use craftly_core::{Email, Role, UserId};

use super::{CliError, connect};

/// Top level of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub sellers: Vec<SeedSeller>,
}

/// A seller and the products to list for them.
#[derive(Debug, Deserialize)]
pub struct SeedSeller {
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

/// What a seeding run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub sellers_created: usize,
    pub products_inserted: usize,
    pub products_skipped: usize,
}

/// Parse and check a seed file without touching the database.
///
/// # Errors
///
/// Returns `CliError::Seed` naming the first invalid entry.
pub fn parse(content: &str) -> Result<SeedFile, CliError> {
    let file: SeedFile =
        serde_yaml::from_str(content).map_err(|e| CliError::Seed(e.to_string()))?;

    for seller in &file.sellers {
        Email::parse(&seller.email)
            .map_err(|e| CliError::Seed(format!("seller {}: {e}", seller.email)))?;
        for product in &seller.products {
            product.validate().map_err(|e| {
                CliError::Seed(format!("{} / {}: {e}", seller.email, product.title))
            })?;
        }
    }

    Ok(file)
}

/// Seed from the YAML file at `file_path`.
///
/// # Errors
///
/// Returns `CliError` if the file is missing or invalid, or a database
/// operation fails.
pub async fn run(file_path: &str) -> Result<(), CliError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(CliError::Seed(format!("File not found: {file_path}")));
    }

    info!(path = %file_path, "Loading seed file");
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Seed(e.to_string()))?;

    // Validate everything before connecting
    let file = parse(&content)?;
    info!(sellers = file.sellers.len(), "Seed file validated");

    let pool = connect().await?;
    let summary = seed(&pool, &file).await?;

    info!("Seeding complete!");
    info!("  Sellers created: {}", summary.sellers_created);
    info!("  Products inserted: {}", summary.products_inserted);
    info!("  Products skipped (already listed): {}", summary.products_skipped);
    Ok(())
}

async fn seed(pool: &PgPool, file: &SeedFile) -> Result<SeedSummary, CliError> {
    let users = UserRepository::new(pool);
    let products = ProductRepository::new(pool);
    let mut summary = SeedSummary::default();

    for seller in &file.sellers {
        let (seller_id, created) = ensure_account(pool, &users, seller).await?;
        if created {
            summary.sellers_created += 1;
        }
        users.grant_role(seller_id, Role::Seller).await?;

        for product in &seller.products {
            if already_listed(pool, seller_id, &product.title).await? {
                summary.products_skipped += 1;
                continue;
            }
            let created = products.create(seller_id, product).await?;
            info!(product_id = %created.id, title = %created.title, "Listed");
            summary.products_inserted += 1;
        }
    }

    Ok(summary)
}

/// Find the seller's account, registering it when a password is given.
async fn ensure_account(
    pool: &PgPool,
    users: &UserRepository<'_>,
    seller: &SeedSeller,
) -> Result<(UserId, bool), CliError> {
    let email = Email::parse(&seller.email)
        .map_err(|e| CliError::InvalidEmail(format!("{}: {e}", seller.email)))?;

    if let Some(user) = users.get_by_email(&email).await? {
        return Ok((user.id, false));
    }

    let Some(password) = seller.password.as_deref() else {
        warn!(email = %seller.email, "Account missing and no password given");
        return Err(CliError::UserNotFound(seller.email.clone()));
    };

    let user = AuthService::new(pool)
        .register(email.as_str(), password, &seller.display_name)
        .await?;
    info!(user_id = %user.id, email = %user.email, "Created seller account");
    Ok((user.id, true))
}

async fn already_listed(pool: &PgPool, seller_id: UserId, title: &str) -> Result<bool, CliError> {
    let exists = sqlx::query_scalar::<_, bool>(
        r"
        SELECT EXISTS (
            SELECT 1 FROM craftly.product
            WHERE seller_id = $1 AND lower(title) = lower($2)
        )
        ",
    )
    .bind(seller_id)
    .bind(title.trim())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}
