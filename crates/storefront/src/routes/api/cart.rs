//! Cart endpoints. Non-admins only ever see and change their own rows.

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;

use stitchline_core::CartItemId;

use super::{ApiJson, ApiPath, created, deleted, ok};
use crate::error::AppError;
use crate::middleware::RequireCaller;
use crate::services::cart::{AddToCart, CartService, CartView};
use crate::state::AppState;

/// Quantity change payload.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i32,
}

/// Visible cart lines with totals. For admins the totals cover every row.
pub async fn list(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<impl IntoResponse, AppError> {
    let items = CartService::new(state.repos()).list(&caller).await?;
    Ok(ok(CartView::new(items, state.config().shipping_fee)))
}

pub async fn add(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiJson(input): ApiJson<AddToCart>,
) -> Result<impl IntoResponse, AppError> {
    Ok(created(
        CartService::new(state.repos()).add(&caller, input).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<CartItemId>,
    ApiJson(input): ApiJson<UpdateQuantity>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(CartService::new(state.repos())
        .update_quantity(&caller, id, input.quantity)
        .await?))
}

pub async fn remove(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<CartItemId>,
) -> Result<impl IntoResponse, AppError> {
    CartService::new(state.repos()).remove(&caller, id).await?;
    Ok(deleted())
}
