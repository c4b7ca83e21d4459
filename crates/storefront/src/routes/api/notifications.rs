//! Admin notification feed.

use axum::{extract::State, response::IntoResponse};
use serde_json::json;

use super::ok;
use crate::error::AppError;
use crate::middleware::RequireCaller;
use crate::services::notifications::NotificationService;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(NotificationService::new(state.repos())
        .list(&caller)
        .await?))
}

/// Delete every notification.
pub async fn clear(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<impl IntoResponse, AppError> {
    let deleted = NotificationService::new(state.repos())
        .clear(&caller)
        .await?;
    Ok(ok(json!({ "deleted": deleted })))
}
