//! Caller identity and the row visibility it grants.

use serde::Serialize;

use stitchline_core::{Role, UserId};

/// The identity behind a request, with its role freshly resolved from the
/// datastore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl Caller {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Which rows of an owned resource a caller may see or change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// Admin bypass: every row.
    All,
    /// Only rows whose `user_id` is this user.
    Owner(UserId),
}

impl AccessScope {
    /// Owner filter to hand to a repository, `None` meaning unrestricted.
    #[must_use]
    pub const fn owner(self) -> Option<UserId> {
        match self {
            Self::All => None,
            Self::Owner(id) => Some(id),
        }
    }

    /// Whether a row owned by `owner` is visible in this scope.
    #[must_use]
    pub fn permits(self, owner: UserId) -> bool {
        match self {
            Self::All => true,
            Self::Owner(id) => id == owner,
        }
    }
}
