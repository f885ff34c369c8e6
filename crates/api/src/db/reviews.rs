//! Review repository.
//!
//! A product's `rating_average` and `rating_count` are recomputed in the
//! same transaction as every review insert or delete.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use craftly_core::{NotificationKind, ProductId, ReviewId, UserId};

use super::{RepositoryError, notifications};
use crate::models::{NewReview, Review};

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    user_id: i32,
    author_name: String,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            product_id: ProductId::new(row.product_id),
            user_id: UserId::new(row.user_id),
            author_name: row.author_name,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

const SELECT_REVIEW: &str = r"
    SELECT r.id, r.product_id, r.user_id, p.display_name AS author_name,
           r.rating, r.comment, r.created_at
    FROM craftly.review r
    JOIN craftly.profile p ON p.user_id = r.user_id
";

async fn recompute_rating(conn: &mut PgConnection, product_id: ProductId) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        UPDATE craftly.product SET
            rating_average = COALESCE(
                (SELECT AVG(rating)::DOUBLE PRECISION FROM craftly.review WHERE product_id = $1),
                0
            ),
            rating_count = (SELECT COUNT(*)::INTEGER FROM craftly.review WHERE product_id = $1)
        WHERE id = $1
        ",
    )
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{SELECT_REVIEW} WHERE r.product_id = $1 ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!("{SELECT_REVIEW} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Insert a review, refresh the product's rating and notify its seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the user already reviewed it.
    pub async fn create(&self, user_id: UserId, review: &NewReview) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (seller_id, title) = sqlx::query_as::<_, (UserId, String)>(
            "SELECT seller_id, title FROM craftly.product WHERE id = $1 FOR UPDATE",
        )
        .bind(review.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let id = sqlx::query_scalar::<_, ReviewId>(
            r"
            INSERT INTO craftly.review (product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(review.product_id)
        .bind(user_id)
        .bind(review.rating)
        .bind(review.comment.trim())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::on_unique(e, "you have already reviewed this product"))?;

        recompute_rating(&mut tx, review.product_id).await?;

        if seller_id != user_id {
            notifications::insert(
                &mut *tx,
                seller_id,
                NotificationKind::Review,
                &format!("New {}-star review", review.rating),
                &format!("Someone reviewed \"{title}\"."),
            )
            .await?;
        }

        tx.commit().await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a review and refresh the product's rating.
    ///
    /// Returns the product the review belonged to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn delete(&self, id: ReviewId) -> Result<ProductId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_id = sqlx::query_scalar::<_, ProductId>(
            "DELETE FROM craftly.review WHERE id = $1 RETURNING product_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        recompute_rating(&mut tx, product_id).await?;
        tx.commit().await?;

        Ok(product_id)
    }
}
