//! Account listing and profile reads.

use serde::Deserialize;
use tracing::instrument;

use stitchline_core::{Role, UserId};

use crate::db::Repositories;
use crate::error::AppError;
use crate::models::{Caller, User};
use crate::services::auth::AuthService;
use crate::services::guard::{authorize, require_admin};

/// Name change payload. The current password must be supplied.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateName {
    pub full_name: String,
    pub password: String,
}

pub struct UserService<'a> {
    repos: &'a Repositories,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Every account, for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for non-admins.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn list(&self, caller: &Caller) -> Result<Vec<User>, AppError> {
        require_admin(caller)?;
        Ok(self.repos.users.list().await?)
    }

    /// A single profile: the caller's own, or anyone's for admins.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for another user's profile and
    /// `AppError::NotFound` if the account does not exist.
    #[instrument(skip(self), fields(user_id = %caller.id))]
    pub async fn get(&self, caller: &Caller, id: UserId) -> Result<User, AppError> {
        authorize(caller, Some(id), Role::User)?;
        self.repos
            .users
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
    }

    /// # Errors
    ///
    /// Returns `AppError::Auth` if the password is wrong or the name blank.
    pub async fn update_name(&self, caller: &Caller, input: UpdateName) -> Result<User, AppError> {
        let user = AuthService::new(self.repos)
            .update_name(caller.id, &input.password, &input.full_name)
            .await?;
        tracing::info!(user_id = %user.id, "Display name changed");
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::test_support::seed_user;

    #[tokio::test]
    async fn test_profile_access() {
        let repos = Repositories::from_store(Arc::new(MemoryStore::new()));
        let admin = seed_user(&repos, "admin@x.pk", Role::Admin).await;
        let alice = seed_user(&repos, "alice@x.pk", Role::User).await;
        let bob = seed_user(&repos, "bob@x.pk", Role::User).await;
        let users = UserService::new(&repos);

        assert_eq!(users.get(&alice.caller(), alice.id).await.unwrap().id, alice.id);
        assert!(matches!(
            users.get(&alice.caller(), bob.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(users.get(&admin.caller(), bob.id).await.unwrap().id, bob.id);
        assert!(matches!(
            users.get(&admin.caller(), UserId::new(999)).await,
            Err(AppError::NotFound(_))
        ));

        assert!(matches!(users.list(&alice.caller()).await, Err(AppError::Forbidden(_))));
        assert_eq!(users.list(&admin.caller()).await.unwrap().len(), 3);
    }
}
