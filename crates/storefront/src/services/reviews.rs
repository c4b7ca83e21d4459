//! Product reviews.

use serde::Deserialize;
use tracing::instrument;

use stitchline_core::{ProductId, Rating, ReviewId, Role};

use crate::db::Repositories;
use crate::error::AppError;
use crate::models::{Caller, NewReview, Review};
use crate::services::guard::authorize;

/// Longest accepted review comment, in characters.
const MAX_COMMENT_CHARS: usize = 2000;

/// Review payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

pub struct ReviewService<'a> {
    repos: &'a Repositories,
}

impl<'a> ReviewService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    pub async fn list(&self, product_id: ProductId) -> Result<Vec<Review>, AppError> {
        self.ensure_product(product_id).await?;
        Ok(self.repos.reviews.list_for_product(product_id).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Validation` for a rating outside 1-5 or an
    /// overlong comment and `AppError::NotFound` for an unknown product.
    #[instrument(skip(self, input), fields(user_id = %caller.id))]
    pub async fn create(
        &self,
        caller: &Caller,
        product_id: ProductId,
        input: ReviewInput,
    ) -> Result<Review, AppError> {
        let rating = Rating::new(input.rating)
            .map_err(|e| AppError::Validation(format!("rating: {e}")))?;
        let comment = input.comment.trim().to_string();
        if comment.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::Validation(format!(
                "comment must be at most {MAX_COMMENT_CHARS} characters"
            )));
        }
        self.ensure_product(product_id).await?;

        let review = self
            .repos
            .reviews
            .insert(&NewReview {
                user_id: caller.id,
                product_id,
                rating,
                comment,
            })
            .await?;
        tracing::info!(review_id = %review.id, %product_id, "Review posted");
        Ok(review)
    }

    /// Authors may delete their own reviews; admins may delete any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFoundOrUnauthorized` if no visible review matched.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: ReviewId) -> Result<(), AppError> {
        let scope = authorize(caller, None, Role::User)?;
        if !self.repos.reviews.delete(id, scope.owner()).await? {
            return Err(AppError::NotFoundOrUnauthorized);
        }
        Ok(())
    }

    async fn ensure_product(&self, id: ProductId) -> Result<(), AppError> {
        if self.repos.products.get(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Product {id} not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::test_support::{seed_categories, seed_product, seed_user};

    #[tokio::test]
    async fn test_review_lifecycle() {
        let repos = Repositories::from_store(Arc::new(MemoryStore::new()));
        let alice = seed_user(&repos, "alice@x.pk", Role::User).await;
        let bob = seed_user(&repos, "bob@x.pk", Role::User).await;
        let admin = seed_user(&repos, "admin@x.pk", Role::Admin).await;
        let (category, design) = seed_categories(&repos).await;
        let product = seed_product(&repos, "Tee", 500, category.id, design.id).await;
        let reviews = ReviewService::new(&repos);

        let first = reviews
            .create(
                &alice.caller(),
                product.id,
                ReviewInput {
                    rating: 5,
                    comment: " Lovely print ".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(first.comment, "Lovely print");
        assert_eq!(first.reviewer_name, alice.full_name);

        let second = reviews
            .create(
                &bob.caller(),
                product.id,
                ReviewInput {
                    rating: 3,
                    comment: String::new(),
                },
            )
            .await
            .unwrap();

        let listed = reviews.list(product.id).await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        assert!(matches!(
            reviews.delete(&bob.caller(), first.id).await,
            Err(AppError::NotFoundOrUnauthorized)
        ));
        reviews.delete(&alice.caller(), first.id).await.unwrap();
        reviews.delete(&admin.caller(), second.id).await.unwrap();
        assert!(reviews.list(product.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_review_validation() {
        let repos = Repositories::from_store(Arc::new(MemoryStore::new()));
        let alice = seed_user(&repos, "alice@x.pk", Role::User).await;
        let (category, design) = seed_categories(&repos).await;
        let product = seed_product(&repos, "Tee", 500, category.id, design.id).await;
        let reviews = ReviewService::new(&repos);

        let bad_rating = ReviewInput {
            rating: 6,
            comment: "x".into(),
        };
        assert!(matches!(
            reviews.create(&alice.caller(), product.id, bad_rating).await,
            Err(AppError::Validation(_))
        ));

        let ok = ReviewInput {
            rating: 4,
            comment: "x".into(),
        };
        assert!(matches!(
            reviews.create(&alice.caller(), ProductId::new(999), ok).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            reviews.list(ProductId::new(999)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
