//! Authentication extractors and session helpers.
//!
//! The session holds a [`CurrentUser`]; the extractors turn it into a
//! [`Caller`] whose role is re-read from the datastore on every request.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{Caller, CurrentUser, User, session::keys};
use crate::services::guard::resolve_caller;
use crate::state::AppState;

/// Extractor that requires a signed-in caller.
///
/// API requests without a session get a 401; page requests are redirected
/// to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireCaller(caller): RequireCaller,
/// ) -> impl IntoResponse {
///     format!("Hello, user {}!", caller.id)
/// }
/// ```
pub struct RequireCaller(pub Caller);

/// Error returned when authentication is required but missing.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthenticated response (for API requests).
    Unauthenticated,
    /// The session could not be resolved.
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthenticated => {
                AppError::Unauthenticated("Authentication required".to_string()).into_response()
            }
            Self::Failed(err) => err.into_response(),
        }
    }
}

fn is_api_request(parts: &Parts) -> bool {
    // Nested routers see a stripped URI.
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |uri| uri.0.path())
        .starts_with("/api/")
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentUser>(keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session");
            None
        }
    }
}

impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(current) = session_user(parts).await else {
            return Err(if is_api_request(parts) {
                AuthRejection::Unauthenticated
            } else {
                AuthRejection::RedirectToLogin
            });
        };

        let caller = resolve_caller(state.repos().users.as_ref(), current)
            .await
            .map_err(AuthRejection::Failed)?;

        Ok(Self(caller))
    }
}

/// Extractor that optionally resolves the caller.
///
/// Unlike `RequireCaller`, a missing session or a session pointing at a
/// deleted account yields `None`.
pub struct OptionalCaller(pub Option<Caller>);

impl FromRequestParts<AppState> for OptionalCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(current) = session_user(parts).await else {
            return Ok(Self(None));
        };

        match resolve_caller(state.repos().users.as_ref(), current).await {
            Ok(caller) => Ok(Self(Some(caller))),
            Err(AppError::NotFound(_)) => Ok(Self(None)),
            Err(e) => Err(e),
        }
    }
}

/// Start an authenticated session for `user`.
///
/// The session id is cycled first so a pre-login id cannot be fixed.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(
            keys::CURRENT_USER,
            CurrentUser {
                id: user.id,
                role: user.role,
            },
        )
        .await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// End the session (logout). The stored session record is deleted.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await?;
    clear_sentry_user();
    Ok(())
}
