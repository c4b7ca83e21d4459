//! Order endpoints.

use axum::{extract::State, response::IntoResponse};

use stitchline_core::OrderId;

use super::{ApiJson, ApiPath, created, deleted, ok};
use crate::error::AppError;
use crate::middleware::RequireCaller;
use crate::services::orders::{CreateOrder, OrderService, UpdateOrderStatus};
use crate::state::AppState;

fn service(state: &AppState) -> OrderService<'_> {
    OrderService::new(state.repos(), state.config().shipping_fee)
}

/// Orders visible to the caller, newest first.
pub async fn list(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(service(&state).list(&caller).await?))
}

/// Place a single-product order outside the cart flow.
pub async fn create(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiJson(input): ApiJson<CreateOrder>,
) -> Result<impl IntoResponse, AppError> {
    Ok(created(service(&state).create(&caller, input).await?))
}

/// Change an order's status (admin).
pub async fn update_status(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(input): ApiJson<UpdateOrderStatus>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(service(&state)
        .update_status(&caller, id, &input.status)
        .await?))
}

/// Delete an order (admin).
pub async fn delete(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<impl IntoResponse, AppError> {
    service(&state).delete(&caller, id).await?;
    Ok(deleted())
}
