//! Standalone image upload (admin).

use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    response::IntoResponse,
};
use serde_json::json;

use super::created;
use crate::error::AppError;
use crate::middleware::RequireCaller;
use crate::services::guard::require_admin;
use crate::services::media::Upload;
use crate::state::AppState;

/// Store every file in the body and return their URLs in upload order.
pub async fn upload(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&caller)?;
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        uploads.push(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    if uploads.is_empty() {
        return Err(AppError::Validation("No files uploaded".to_string()));
    }

    let urls = state.media().store_all(&uploads).await?;
    Ok(created(json!({ "urls": urls })))
}
