//! Product review endpoints.

use axum::{extract::State, response::IntoResponse};

use stitchline_core::{ProductId, ReviewId};

use super::{ApiJson, ApiPath, created, deleted, ok};
use crate::error::AppError;
use crate::middleware::RequireCaller;
use crate::services::reviews::{ReviewInput, ReviewService};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(ReviewService::new(state.repos()).list(product_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(created(
        ReviewService::new(state.repos())
            .create(&caller, product_id, input)
            .await?,
    ))
}

/// Delete a review (author or admin).
pub async fn delete(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<impl IntoResponse, AppError> {
    ReviewService::new(state.repos()).delete(&caller, id).await?;
    Ok(deleted())
}
