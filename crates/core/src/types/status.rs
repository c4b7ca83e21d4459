//! Roles and statuses.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Account role. The role is the only authorization axis: admins bypass
/// ownership filters, users are restricted to their own rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer account.
    #[default]
    User,
    /// Back-office account.
    Admin,
}

impl Role {
    /// Whether this role bypasses ownership checks.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Order status.
///
/// Stored as free text. New orders are `pending`; admins may set any other
/// label and no transition rules are enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    /// Status assigned to every new order.
    pub const PENDING: &'static str = "pending";

    /// Longest accepted status label.
    pub const MAX_LENGTH: usize = 32;

    /// Create a status from a label, trimming and lowercasing it.
    ///
    /// Returns `None` for an empty or overlong label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() || label.len() > Self::MAX_LENGTH {
            return None;
        }
        Some(Self(label.to_lowercase()))
    }

    /// The `pending` status.
    #[must_use]
    pub fn pending() -> Self {
        Self(Self::PENDING.to_owned())
    }

    /// The status label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::pending()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::User, Role::Admin] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
        assert!(Role::Admin.is_admin());
        assert!(!Role::default().is_admin());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_order_status() {
        assert_eq!(OrderStatus::default().as_str(), "pending");
        assert_eq!(OrderStatus::parse(" Shipped ").unwrap().as_str(), "shipped");
        assert!(OrderStatus::parse("  ").is_none());
        assert!(OrderStatus::parse(&"x".repeat(40)).is_none());
    }
}
