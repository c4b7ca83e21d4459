//! Review repository.

use async_trait::async_trait;

use stitchline_core::{ProductId, ReviewId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{NewReview, Review};

/// Persistence for product reviews.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Reviews of one product, newest first.
    async fn list_for_product(&self, product_id: ProductId)
    -> Result<Vec<Review>, RepositoryError>;

    async fn insert(&self, review: &NewReview) -> Result<Review, RepositoryError>;

    /// Returns `false` if no row matched the id and owner filter.
    async fn delete(&self, id: ReviewId, owner: Option<UserId>) -> Result<bool, RepositoryError>;
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(
            r"
            SELECT r.id, r.user_id, r.product_id, u.full_name AS reviewer_name,
                   r.rating, r.comment, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool())
        .await?;
        Ok(reviews)
    }

    async fn insert(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        sqlx::query_as::<_, Review>(
            r"
            WITH inserted AS (
                INSERT INTO reviews (user_id, product_id, rating, comment)
                VALUES ($1, $2, $3, $4)
                RETURNING id, user_id, product_id, rating, comment, created_at
            )
            SELECT i.id, i.user_id, i.product_id, u.full_name AS reviewer_name,
                   i.rating, i.comment, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            ",
        )
        .bind(review.user_id)
        .bind(review.product_id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "referenced row does not exist"))
    }

    async fn delete(&self, id: ReviewId, owner: Option<UserId>) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM reviews WHERE id = $1 AND ($2::INT4 IS NULL OR user_id = $2)",
        )
        .bind(id)
        .bind(owner)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
