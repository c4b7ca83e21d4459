//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stitchline_core::{Email, Role, UserId};

use super::Caller;

/// A storefront account. The password hash and reset code never leave the
/// repository layer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub alt_phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// This account as a request caller.
    #[must_use]
    pub const fn caller(&self) -> Caller {
        Caller {
            id: self.id,
            role: self.role,
        }
    }
}

/// Data for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub alt_phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}
