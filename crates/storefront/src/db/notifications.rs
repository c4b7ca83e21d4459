//! Notification repository.

use async_trait::async_trait;

use super::{PgStore, RepositoryError};
use crate::models::Notification;

/// Persistence for global admin notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// All notifications, newest first.
    async fn list(&self) -> Result<Vec<Notification>, RepositoryError>;

    async fn insert(&self, message: &str) -> Result<Notification, RepositoryError>;

    /// Delete every notification, returning how many were removed.
    async fn delete_all(&self) -> Result<u64, RepositoryError>;
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn list(&self) -> Result<Vec<Notification>, RepositoryError> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT id, message, created_at FROM notifications ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(notifications)
    }

    async fn insert(&self, message: &str) -> Result<Notification, RepositoryError> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (message) VALUES ($1) RETURNING id, message, created_at",
        )
        .bind(message)
        .fetch_one(self.pool())
        .await?;
        Ok(notification)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM notifications")
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
