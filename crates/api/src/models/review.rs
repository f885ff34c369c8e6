//! Product review domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use craftly_core::validation::{ValidationError, validate_rating, validate_review_comment};
use craftly_core::{ProductId, ReviewId, UserId};

/// A buyer's review of a product.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub author_name: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Review submission.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub product_id: ProductId,
    pub rating: i16,
    pub comment: String,
}

impl NewReview {
    /// # Errors
    ///
    /// Returns a rating or comment length error.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_rating(self.rating)?;
        validate_review_comment(&self.comment)
    }
}
