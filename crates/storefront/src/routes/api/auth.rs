//! Signup, login, logout, session lookup and password reset.

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use super::{ApiJson, created, ok};
use crate::error::{AppError, add_breadcrumb};
use crate::middleware::{RequireCaller, clear_current_user, set_current_user};
use crate::services::auth::{AuthService, Signup};
use crate::state::AppState;

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Reset code request payload.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

/// Reset confirmation payload.
#[derive(Debug, Deserialize)]
pub struct ResetConfirm {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Response to a reset code request.
///
/// `code` is only present when the storefront echoes reset codes.
#[derive(Debug, Serialize)]
pub struct ResetIssued {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Create a customer account and sign it in.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<Signup>,
) -> Result<impl IntoResponse, AppError> {
    let user = AuthService::new(state.repos()).signup(input).await?;
    set_current_user(&session, &user).await?;
    add_breadcrumb("auth", "Signed up", None);
    Ok(created(user))
}

/// Sign in with email and password.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(input): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = AuthService::new(state.repos())
        .login(&input.email, &input.password)
        .await?;
    set_current_user(&session, &user).await?;
    add_breadcrumb("auth", "Logged in", None);
    Ok(ok(user))
}

/// Sign out. Succeeds whether or not a session existed.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<impl IntoResponse, AppError> {
    clear_current_user(&session).await?;
    Ok(ok(json!({ "signed_out": true })))
}

/// The signed-in caller's `{id, role}`.
pub async fn current(RequireCaller(caller): RequireCaller) -> impl IntoResponse {
    ok(caller)
}

/// Issue a password reset code.
///
/// Known accounts get the code by mail when SMTP is configured. The code is
/// only echoed back when `expose_reset_codes` is on, and then for unknown
/// emails too, so the answer never depends on whether the account exists.
#[instrument(skip_all)]
pub async fn request_reset(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let issued = AuthService::new(state.repos())
        .request_password_reset(&input.email)
        .await?;

    if issued.stored
        && let Some(mailer) = state.email()
    {
        mailer.send_reset_code(input.email.trim(), &issued.code).await?;
    }

    Ok(ok(ResetIssued {
        message: "If the account exists, a reset code has been issued",
        code: state.config().expose_reset_codes.then_some(issued.code),
    }))
}

/// Set a new password with a reset code.
#[instrument(skip_all)]
pub async fn confirm_reset(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ResetConfirm>,
) -> Result<impl IntoResponse, AppError> {
    AuthService::new(state.repos())
        .confirm_password_reset(&input.email, &input.code, &input.new_password)
        .await?;
    Ok(ok(json!({ "reset": true })))
}
