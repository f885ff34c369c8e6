//! Review repository.

use reqwest::Method;
use tracing::instrument;

use craftly_core::validation::{validate_rating, validate_review_comment};
use craftly_core::{ProductId, ReviewId};

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{NewReview, Review};
use crate::repositories::rejected;

/// Product reviews.
#[derive(Clone)]
pub struct ReviewRepository {
    client: ApiClient,
}

impl ReviewRepository {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn for_product(&self, product_id: ProductId) -> Result<Vec<Review>, ClientError> {
        self.client
            .get(&format!("/api/reviews/product/{product_id}"))
            .await
    }

    /// Submit a review.
    ///
    /// Rating (1 to 5) and comment length (10 to 500) are checked locally.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad rating or comment; `Api` 409 for a second
    /// review of the same product.
    #[instrument(skip(self, review), fields(product_id = %review.product_id))]
    pub async fn create(&self, review: &NewReview) -> Result<Review, ClientError> {
        validate_rating(review.rating).map_err(rejected)?;
        validate_review_comment(&review.comment).map_err(rejected)?;
        self.client.post("/api/reviews", review).await
    }

    /// Delete one of the caller's reviews.
    ///
    /// # Errors
    ///
    /// `Api` 403 for someone else's review.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ReviewId) -> Result<(), ClientError> {
        self.client
            .send::<()>(Method::DELETE, &format!("/api/reviews/{id}"), None)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;

    use super::*;
    use crate::testing::serve;

    #[tokio::test]
    async fn test_review_checked_before_sending() {
        let reviews = ReviewRepository::new(serve(Router::new()).await);

        let mut review = NewReview {
            product_id: ProductId::new(1),
            rating: 6,
            comment: "Beautiful grain and finish".to_owned(),
        };
        let err = reviews.create(&review).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref m) if m.contains("rating")));

        review.rating = 5;
        review.comment = "nice".to_owned();
        let err = reviews.create(&review).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref m) if m.contains("comment")));
    }
}
