//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use stitchline_core::{Role, UserId};

/// Session-stored user identity.
///
/// The cookie only carries the opaque session id; this claim lives in the
/// session store. The role is what the user had at login and is used for
/// display. Authorization re-reads it from the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Role at the time the session was issued.
    pub role: Role,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the receipt shown on the order confirmation page.
    pub const LAST_CHECKOUT: &str = "last_checkout";
}
