//! Product reviews.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stitchline_core::{ProductId, Rating, ReviewId, UserId};

/// A stored review, with the reviewer's display name joined in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub reviewer_name: String,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: Rating,
    pub comment: String,
}
