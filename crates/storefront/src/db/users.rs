//! User repository.
//!
//! Accounts, roles and password reset codes. Password hashes are only
//! returned by the credential lookups used for login and re-verification.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stitchline_core::{Email, Role, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{NewUser, User};

/// Persistence for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Check the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Insert a user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up a user and their password hash by email.
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError>;

    /// All users, oldest first.
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    async fn update_name(
        &self,
        id: UserId,
        full_name: &str,
    ) -> Result<Option<User>, RepositoryError>;

    async fn set_role(&self, id: UserId, role: Role) -> Result<Option<User>, RepositoryError>;

    /// Store a reset code for the account with this email.
    ///
    /// Returns `false` when no such account exists.
    async fn store_reset_code(
        &self,
        email: &Email,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Replace the password hash if `code` matches the stored, unexpired
    /// reset code, clearing the code in the same write.
    ///
    /// Returns `false` (and changes nothing) on any mismatch.
    async fn reset_password(
        &self,
        email: &Email,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

const USER_COLUMNS: &str =
    "id, email, full_name, role, phone_number, alt_phone_number, address, city, created_at";

#[async_trait]
impl UserRepository for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(self.pool()).await?;
        Ok(())
    }

    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            r"
            INSERT INTO users (email, password_hash, full_name, role,
                               phone_number, alt_phone_number, address, city)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(&user.phone_number)
        .bind(&user.alt_phone_number)
        .bind(&user.address)
        .bind(&user.city)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "email already exists"))
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(hash)
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(users)
    }

    async fn update_name(
        &self,
        id: UserId,
        full_name: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE users SET full_name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(full_name)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn set_role(&self, id: UserId, role: Role) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE users SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn store_reset_code(
        &self,
        email: &Email,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users SET reset_code = $2, reset_code_expires_at = $3, updated_at = NOW()
            WHERE email = $1
            ",
        )
        .bind(email)
        .bind(code)
        .bind(expires_at)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reset_password(
        &self,
        email: &Email,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET password_hash = $3, reset_code = NULL, reset_code_expires_at = NULL,
                updated_at = NOW()
            WHERE email = $1 AND reset_code = $2 AND reset_code_expires_at > $4
            ",
        )
        .bind(email)
        .bind(code)
        .bind(password_hash)
        .bind(now)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
