//! Favourite products repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use craftly_core::{ProductId, UserId};

use super::RepositoryError;
use super::products::{PRODUCT_COLUMNS, ProductRow};
use crate::models::FavoriteItem;

#[derive(Debug, sqlx::FromRow)]
struct FavoriteRow {
    #[sqlx(flatten)]
    product: ProductRow,
    added_at: DateTime<Utc>,
}

/// Repository for favourite database operations.
pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    /// Create a new favourite repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's favourites, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<FavoriteItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, FavoriteRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}, f.added_at
            FROM craftly.favorite f
            JOIN craftly.product p ON p.id = f.product_id
            WHERE f.user_id = $1
            ORDER BY f.added_at DESC, p.id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(FavoriteItem {
                    product: r.product.try_into()?,
                    added_at: r.added_at,
                })
            })
            .collect()
    }

    /// Favourite a product. Adding an existing favourite is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO craftly.favorite (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::on_missing_parent)?;
        Ok(())
    }

    /// Remove a favourite. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM craftly.favorite WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether the user has favourited the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn contains(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let found = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM craftly.favorite WHERE user_id = $1 AND product_id = $2
            )
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(found)
    }
}
