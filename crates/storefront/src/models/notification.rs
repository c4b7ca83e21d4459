//! Back-office notifications.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stitchline_core::NotificationId;

/// A global notice for admins (new orders, new signups).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
