//! Integration tests for Craftly.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database and start the API. Every test signs up its own
//! # accounts from the same IP, so raise the per-IP limits well above the
//! # production defaults (auth burst 5, API burst 50).
//! cargo run -p craftly-cli -- migrate
//! CRAFTLY_AUTH_RATE_BURST=1000 CRAFTLY_API_RATE_BURST=5000 cargo run -p craftly-api
//!
//! # Run integration tests
//! CRAFTLY_API_URL=http://localhost:8080 \
//! CRAFTLY_DATABASE_URL=postgres://localhost/craftly cargo test -p craftly-integration-tests -- --ignored
//! ```
//!
//! Each test signs up its own accounts with unique emails, so tests can run
//! against a shared database in any order.

use rust_decimal::Decimal;
use sqlx::PgPool;

use craftly_client::models::{NewProduct, User};
use craftly_client::{ClientConfig, ClientError, Craftly};
use craftly_core::{ProductSummary, Role, ShippingAddress, UserId};

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "test-password-1234";

/// A signed-in client and the account behind it.
pub struct TestUser {
    pub app: Craftly,
    pub user: User,
}

/// A fresh client pointed at `CRAFTLY_API_URL`, with its own cookie jar.
///
/// # Errors
///
/// Returns `ClientError` if the configuration or HTTP client is invalid.
pub fn client() -> Result<Craftly, ClientError> {
    let config = ClientConfig::from_env().map_err(|e| ClientError::Validation(e.to_string()))?;
    Craftly::new(&config)
}

/// An email address no other test run has used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@craftly.test", uuid::Uuid::new_v4().simple())
}

/// Register a new buyer and keep the session.
///
/// # Errors
///
/// Returns `ClientError` if registration fails.
pub async fn sign_up(prefix: &str) -> Result<TestUser, ClientError> {
    let app = client()?;
    let user = app
        .auth
        .register(&unique_email(prefix), TEST_PASSWORD, &format!("Test {prefix}"))
        .await?;
    Ok(TestUser { app, user })
}

/// Register a new account and upgrade it to a seller.
///
/// # Errors
///
/// Returns `ClientError` if registration or the upgrade fails.
pub async fn sign_up_seller(prefix: &str) -> Result<TestUser, ClientError> {
    let TestUser { app, .. } = sign_up(prefix).await?;
    let user = app.auth.become_seller().await?;
    Ok(TestUser { app, user })
}

/// List a product as `seller`.
///
/// # Errors
///
/// Returns `ClientError` if the listing is rejected.
pub async fn list_product(
    seller: &TestUser,
    title: &str,
    price_cents: i64,
    stock: i32,
) -> Result<ProductSummary, ClientError> {
    seller
        .app
        .products
        .create(&NewProduct {
            title: title.to_string(),
            description: "Made for integration tests".to_string(),
            category: "ceramics".to_string(),
            price: Decimal::new(price_cents, 2),
            image_url: None,
            stock,
        })
        .await
}

/// Connect to the API's database, for changes only the CLI can make.
///
/// # Errors
///
/// Returns `sqlx::Error` if no database URL is set or the connection fails.
pub async fn database() -> Result<PgPool, sqlx::Error> {
    let url = std::env::var("CRAFTLY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| sqlx::Error::Configuration("CRAFTLY_DATABASE_URL is not set".into()))?;
    PgPool::connect(&url).await
}

/// Revoke a role directly in the database, as `craftly-cli user revoke` does.
///
/// # Errors
///
/// Returns `sqlx::Error` if the delete fails.
pub async fn revoke_role(pool: &PgPool, user_id: UserId, role: Role) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM craftly.user_role WHERE user_id = $1 AND role = $2::craftly.role")
        .bind(user_id.as_i32())
        .bind(role.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// A shipping address that passes validation.
#[must_use]
pub fn test_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Ada Tester".to_string(),
        line1: "1 Pottery Lane".to_string(),
        line2: None,
        city: "Portland".to_string(),
        region: Some("OR".to_string()),
        postal_code: "97201".to_string(),
        country: "US".to_string(),
        phone: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_emails_differ() {
        assert_ne!(unique_email("a"), unique_email("a"));
        assert!(unique_email("buyer").starts_with("buyer-"));
    }

    #[test]
    fn test_address_is_valid() {
        assert!(test_address().validate().is_ok());
    }
}
