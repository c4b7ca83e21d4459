//! Product and design category endpoints. Reads are public.

use axum::{extract::State, response::IntoResponse};

use stitchline_core::{DesignCategoryId, ProductCategoryId};

use super::{ApiJson, ApiPath, created, deleted, ok};
use crate::error::AppError;
use crate::middleware::RequireCaller;
use crate::models::{DesignCategoryInput, ProductCategoryInput};
use crate::services::catalog::CatalogService;
use crate::state::AppState;

// =============================================================================
// Product categories
// =============================================================================

pub async fn list_product_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(CatalogService::new(state.repos())
        .list_product_categories()
        .await?))
}

pub async fn create_product_category(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiJson(input): ApiJson<ProductCategoryInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(created(
        CatalogService::new(state.repos())
            .create_product_category(&caller, input)
            .await?,
    ))
}

pub async fn update_product_category(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<ProductCategoryId>,
    ApiJson(input): ApiJson<ProductCategoryInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(CatalogService::new(state.repos())
        .update_product_category(&caller, id, input)
        .await?))
}

pub async fn delete_product_category(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<ProductCategoryId>,
) -> Result<impl IntoResponse, AppError> {
    CatalogService::new(state.repos())
        .delete_product_category(&caller, id)
        .await?;
    Ok(deleted())
}

// =============================================================================
// Design categories
// =============================================================================

pub async fn list_design_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(CatalogService::new(state.repos())
        .list_design_categories()
        .await?))
}

pub async fn create_design_category(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiJson(input): ApiJson<DesignCategoryInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(created(
        CatalogService::new(state.repos())
            .create_design_category(&caller, input)
            .await?,
    ))
}

pub async fn update_design_category(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<DesignCategoryId>,
    ApiJson(input): ApiJson<DesignCategoryInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(CatalogService::new(state.repos())
        .update_design_category(&caller, id, input)
        .await?))
}

pub async fn delete_design_category(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<DesignCategoryId>,
) -> Result<impl IntoResponse, AppError> {
    CatalogService::new(state.repos())
        .delete_design_category(&caller, id)
        .await?;
    Ok(deleted())
}
