//! Account lookups and the name update.

use axum::{extract::State, response::IntoResponse};

use stitchline_core::UserId;

use super::{ApiJson, ApiPath, ok};
use crate::error::AppError;
use crate::middleware::RequireCaller;
use crate::services::users::{UpdateName, UserService};
use crate::state::AppState;

/// All accounts (admin).
pub async fn list(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(UserService::new(state.repos()).list(&caller).await?))
}

/// One account (self or admin).
pub async fn show(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiPath(id): ApiPath<UserId>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(UserService::new(state.repos()).get(&caller, id).await?))
}

/// Change the caller's display name after re-checking their password.
pub async fn update_name(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    ApiJson(input): ApiJson<UpdateName>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(UserService::new(state.repos())
        .update_name(&caller, input)
        .await?))
}
