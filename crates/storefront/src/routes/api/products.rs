//! Product catalog endpoints.
//!
//! Writes take `multipart/form-data`: text fields plus one or more files in
//! the `images` field, kept in the order they were sent.

use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    response::IntoResponse,
};

use stitchline_core::ProductId;

use super::{ApiPath, ApiQuery, created, deleted, ok};
use crate::error::AppError;
use crate::middleware::RequireCaller;
use crate::models::ProductFilter;
use crate::services::catalog::{CatalogService, ProductForm};
use crate::services::guard::require_admin;
use crate::services::media::Upload;
use crate::state::AppState;

/// Multipart field carrying product images.
const IMAGES_FIELD: &str = "images";

/// Read a product form. Empty file inputs (no file chosen) are skipped.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the multipart body is malformed.
pub async fn read_product_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ProductForm, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().trim_end_matches("[]").to_string();
        if name == IMAGES_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            form.images.push(Upload {
                file_name,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            form.fields.set(&name, value);
        }
    }

    Ok(form)
}

/// Product listing, optionally filtered by category.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(CatalogService::new(state.repos())
        .list_products(filter)
        .await?))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(CatalogService::new(state.repos()).get_product(id).await?))
}

/// Create a product (admin).
pub async fn create(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&caller)?;
    let form = read_product_form(multipart).await?;
    let product = CatalogService::new(state.repos())
        .create_product(&caller, form, &state.media())
        .await?;
    Ok(created(product))
}

/// Update a product (admin). New images replace the whole list.
pub async fn update(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<ProductId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&caller)?;
    let form = read_product_form(multipart).await?;
    let product = CatalogService::new(state.repos())
        .update_product(&caller, id, form, &state.media())
        .await?;
    Ok(ok(product))
}

/// Delete a product (admin).
pub async fn delete(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    CatalogService::new(state.repos())
        .delete_product(&caller, id)
        .await?;
    Ok(deleted())
}
