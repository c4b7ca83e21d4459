//! Global admin notifications.

use tracing::instrument;

use crate::db::{NotificationRepository, Repositories};
use crate::error::AppError;
use crate::models::{Caller, Notification};
use crate::services::guard::require_admin;

/// Record a notification. Failures are logged and swallowed so the
/// triggering operation is never undone by them.
pub async fn notify(repo: &dyn NotificationRepository, message: &str) {
    if let Err(e) = repo.insert(message).await {
        tracing::warn!(error = %e, "Failed to record notification");
    }
}

/// Admin-only access to the notification feed.
pub struct NotificationService<'a> {
    repos: &'a Repositories,
}

impl<'a> NotificationService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Notification>, AppError> {
        require_admin(caller)?;
        Ok(self.repos.notifications.list().await?)
    }

    /// Delete every notification and return how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn clear(&self, caller: &Caller) -> Result<u64, AppError> {
        require_admin(caller)?;
        let removed = self.repos.notifications.delete_all().await?;
        tracing::info!(removed, "Notifications cleared");
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use stitchline_core::Role;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::test_support::seed_user;

    #[tokio::test]
    async fn test_only_admins_read_and_clear() {
        let repos = Repositories::from_store(Arc::new(MemoryStore::new()));
        let admin = seed_user(&repos, "admin@x.pk", Role::Admin).await;
        let user = seed_user(&repos, "user@x.pk", Role::User).await;
        notify(repos.notifications.as_ref(), "first").await;
        notify(repos.notifications.as_ref(), "second").await;

        let service = NotificationService::new(&repos);
        assert!(matches!(
            service.list(&user.caller()).await,
            Err(AppError::Forbidden(_))
        ));

        let listed = service.list(&admin.caller()).await.unwrap();
        assert_eq!(listed[0].message, "second");
        assert_eq!(listed[1].message, "first");

        assert_eq!(service.clear(&admin.caller()).await.unwrap(), 2);
        assert!(service.list(&admin.caller()).await.unwrap().is_empty());
    }
}
