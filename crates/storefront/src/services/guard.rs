//! The single authorization check every resource goes through.

use stitchline_core::{Role, UserId};

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{AccessScope, Caller, CurrentUser};

/// Decide what `caller` may touch.
///
/// * `owner` is the user a request targets (a cart line's `user_id`, a user
///   profile id), or `None` when the request is not about a specific owner.
/// * `required` is the minimum role for the operation.
///
/// Admins always get [`AccessScope::All`]. Everyone else gets their own
/// rows only, and is refused outright when the operation needs an admin or
/// names another user as owner.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when the caller's role or identity does not
/// allow the request.
pub fn authorize(
    caller: &Caller,
    owner: Option<UserId>,
    required: Role,
) -> Result<AccessScope, AppError> {
    if caller.is_admin() {
        return Ok(AccessScope::All);
    }

    if required.is_admin() {
        tracing::warn!(user_id = %caller.id, "Non-admin attempted admin operation");
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    if let Some(owner) = owner
        && owner != caller.id
    {
        tracing::warn!(user_id = %caller.id, owner = %owner, "Cross-user access refused");
        return Err(AppError::Forbidden(
            "Cannot act on another user's data".to_string(),
        ));
    }

    Ok(AccessScope::Owner(caller.id))
}

/// Shorthand for operations only admins may perform.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for non-admins.
pub fn require_admin(caller: &Caller) -> Result<(), AppError> {
    authorize(caller, None, Role::Admin).map(|_| ())
}

/// Re-resolve a session's identity against the users table.
///
/// The role stored in the session is informational only; the stored row is
/// authoritative so demotions take effect on the next request.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the user no longer exists.
pub async fn resolve_caller(
    users: &dyn UserRepository,
    session: CurrentUser,
) -> Result<Caller, AppError> {
    let user = users
        .get_by_id(session.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.role != session.role {
        tracing::debug!(user_id = %user.id, "Session role is stale; using stored role");
    }

    Ok(Caller {
        id: user.id,
        role: user.role,
    })
}
