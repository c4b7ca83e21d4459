//! Authentication service.
//!
//! Password signup and login, password reset codes, and name changes that
//! re-verify the current password.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::seq::IndexedRandom;
use serde::Deserialize;
use tracing::instrument;

use stitchline_core::{Email, Role, UserId};

use crate::db::{RepositoryError, Repositories};
use crate::models::{NewUser, User};
use crate::services::notifications::notify;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of a password reset code.
pub const RESET_CODE_LENGTH: usize = 6;

/// How long a reset code stays valid.
pub const RESET_CODE_TTL_MINUTES: i64 = 30;

const RESET_CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Hash checked against on logins for unknown emails.
static DUMMY_PASSWORD_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("stitchline-unknown-account").ok());

/// Signup payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub alt_phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// A freshly generated reset code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetCode {
    pub code: String,
    /// Whether an account took the code
    pub stored: bool,
}

/// Authentication service.
pub struct AuthService<'a> {
    repos: &'a Repositories,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Register a new customer account. The role is always `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::MissingField` if the name is blank.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip_all, fields(email = %signup.email))]
    pub async fn signup(&self, signup: Signup) -> Result<User, AuthError> {
        let email = Email::parse(&signup.email)?;
        let full_name = required(&signup.full_name, "full_name")?;
        validate_password(&signup.password)?;

        let password_hash = hash_password(&signup.password)?;

        let user = self
            .repos
            .users
            .create(&NewUser {
                email,
                password_hash,
                full_name,
                role: Role::User,
                phone_number: optional(signup.phone_number),
                alt_phone_number: optional(signup.alt_phone_number),
                address: optional(signup.address),
                city: optional(signup.city),
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User signed up");
        notify(
            self.repos.notifications.as_ref(),
            &format!("New customer signed up: {} ({})", user.full_name, user.email),
        )
        .await;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// Unknown emails, malformed emails and wrong passwords all fail the
    /// same way so responses cannot be used to discover accounts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some((user, password_hash)) = self.repos.users.get_credentials(&email).await? else {
            // Spend the same argon2 work as a real account would
            if let Some(dummy) = DUMMY_PASSWORD_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &password_hash)?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// Issue a password reset code for an account.
    ///
    /// A code is generated whether or not the email has an account, so the
    /// result looks the same either way. Only `stored` codes can later be
    /// confirmed. The caller decides whether and how the code reaches the user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    #[instrument(skip_all)]
    pub async fn request_password_reset(&self, email: &str) -> Result<ResetCode, AuthError> {
        let email = Email::parse(email)?;
        let code = generate_reset_code();
        let expires_at = Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES);

        let stored = self
            .repos
            .users
            .store_reset_code(&email, &code, expires_at)
            .await?;

        if stored {
            tracing::info!("Password reset code issued");
        } else {
            tracing::debug!("Password reset requested for unknown email");
        }
        Ok(ResetCode { code, stored })
    }

    /// Set a new password using a previously issued reset code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::InvalidResetCode` if the code does not match or
    /// has expired; the stored hash is left unchanged.
    #[instrument(skip_all)]
    pub async fn confirm_password_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        validate_password(new_password)?;

        let code = code.trim().to_ascii_lowercase();
        if code.len() != RESET_CODE_LENGTH {
            return Err(AuthError::InvalidResetCode);
        }

        let password_hash = hash_password(new_password)?;
        let updated = self
            .repos
            .users
            .reset_password(&email, &code, &password_hash, Utc::now())
            .await?;

        if !updated {
            tracing::warn!("Password reset rejected");
            return Err(AuthError::InvalidResetCode);
        }

        tracing::info!("Password reset completed");
        Ok(())
    }

    /// Change the caller's display name after re-checking their password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if the new name is blank.
    /// Returns `AuthError::InvalidCredentials` if the password is wrong.
    /// Returns `AuthError::UserNotFound` if the account is gone.
    #[instrument(skip(self, password, full_name))]
    pub async fn update_name(
        &self,
        user_id: UserId,
        password: &str,
        full_name: &str,
    ) -> Result<User, AuthError> {
        let full_name = required(full_name, "full_name")?;

        let password_hash = self
            .repos
            .users
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        verify_password(password, &password_hash)?;

        self.repos
            .users
            .update_name(user_id, &full_name)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

fn required(value: &str, field: &'static str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value.to_owned())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Generate a reset code of lowercase letters and digits.
#[must_use]
pub fn generate_reset_code() -> String {
    let mut rng = rand::rng();
    (0..RESET_CODE_LENGTH)
        .filter_map(|_| RESET_CODE_ALPHABET.choose(&mut rng).copied().map(char::from))
        .collect()
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::memory::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, Repositories) {
        let store = Arc::new(MemoryStore::new());
        let repos = Repositories::from_store(store.clone());
        (store, repos)
    }

    fn signup(email: &str) -> Signup {
        Signup {
            email: email.to_owned(),
            password: "correct horse battery".to_owned(),
            full_name: "Ayesha Khan".to_owned(),
            phone_number: Some(" 0300-1234567 ".to_owned()),
            alt_phone_number: Some("  ".to_owned()),
            address: None,
            city: Some("Lahore".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_user_role_and_notifies() {
        let (_, repos) = setup();
        let auth = AuthService::new(&repos);

        let user = auth.signup(signup("Ayesha@Example.pk")).await.unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.email.as_str(), "ayesha@example.pk");
        assert_eq!(user.phone_number.as_deref(), Some("0300-1234567"));
        assert_eq!(user.alt_phone_number, None);

        let notifications = repos.notifications.list().await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].message.contains("Ayesha Khan"));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let (_, repos) = setup();
        let auth = AuthService::new(&repos);

        let mut weak = signup("a@x.pk");
        weak.password = "short".to_owned();
        assert!(matches!(auth.signup(weak).await, Err(AuthError::WeakPassword(_))));

        let mut nameless = signup("a@x.pk");
        nameless.full_name = "   ".to_owned();
        assert!(matches!(
            auth.signup(nameless).await,
            Err(AuthError::MissingField("full_name"))
        ));

        assert!(matches!(
            auth.signup(signup("not-an-email")).await,
            Err(AuthError::InvalidEmail(_))
        ));

        auth.signup(signup("a@x.pk")).await.unwrap();
        assert!(matches!(
            auth.signup(signup("A@X.pk")).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (_, repos) = setup();
        let auth = AuthService::new(&repos);
        auth.signup(signup("a@x.pk")).await.unwrap();

        let wrong_password = auth.login("a@x.pk", "not the password").await.unwrap_err();
        let unknown_email = auth.login("nobody@x.pk", "correct horse battery").await.unwrap_err();
        let malformed = auth.login("nobody", "correct horse battery").await.unwrap_err();

        for err in [&wrong_password, &unknown_email, &malformed] {
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());

        let user = auth.login(" A@X.PK ", "correct horse battery").await.unwrap();
        assert_eq!(user.email.as_str(), "a@x.pk");
    }

    #[tokio::test]
    async fn test_password_reset_wrong_then_right_code() {
        let (store, repos) = setup();
        let auth = AuthService::new(&repos);
        auth.signup(signup("a@x.pk")).await.unwrap();
        let email = Email::parse("a@x.pk").unwrap();
        let original_hash = store.password_hash(&email).unwrap();

        let issued = auth.request_password_reset("a@x.pk").await.unwrap();
        assert!(issued.stored);
        let code = issued.code;
        assert_eq!(code.len(), RESET_CODE_LENGTH);
        assert_eq!(store.reset_code(&email).as_deref(), Some(code.as_str()));

        let wrong = if code == "000000" { "111111" } else { "000000" };
        let err = auth
            .confirm_password_reset("a@x.pk", wrong, "brand new password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidResetCode));
        assert_eq!(store.password_hash(&email).unwrap(), original_hash);

        auth.confirm_password_reset("a@x.pk", &code, "brand new password")
            .await
            .unwrap();
        assert_ne!(store.password_hash(&email).unwrap(), original_hash);
        assert_eq!(store.reset_code(&email), None);

        auth.login("a@x.pk", "brand new password").await.unwrap();
    }

    #[tokio::test]
    async fn test_password_reset_rejects_expired_code() {
        let (store, repos) = setup();
        let auth = AuthService::new(&repos);
        auth.signup(signup("a@x.pk")).await.unwrap();
        let email = Email::parse("a@x.pk").unwrap();

        let code = auth.request_password_reset("a@x.pk").await.unwrap().code;
        store.expire_reset_code(&email, Utc::now() - Duration::seconds(1));

        assert!(matches!(
            auth.confirm_password_reset("a@x.pk", &code, "brand new password").await,
            Err(AuthError::InvalidResetCode)
        ));
    }

    #[tokio::test]
    async fn test_password_reset_for_unknown_email_stores_nothing() {
        let (_, repos) = setup();
        let auth = AuthService::new(&repos);
        let issued = auth.request_password_reset("ghost@x.pk").await.unwrap();
        assert!(!issued.stored);
        assert_eq!(issued.code.len(), RESET_CODE_LENGTH);

        assert!(matches!(
            auth.confirm_password_reset("ghost@x.pk", &issued.code, "brand new password").await,
            Err(AuthError::InvalidResetCode)
        ));
    }

    #[tokio::test]
    async fn test_update_name_requires_password() {
        let (_, repos) = setup();
        let auth = AuthService::new(&repos);
        let user = auth.signup(signup("a@x.pk")).await.unwrap();

        assert!(matches!(
            auth.update_name(user.id, "wrong password", "New Name").await,
            Err(AuthError::InvalidCredentials)
        ));

        let updated = auth
            .update_name(user.id, "correct horse battery", "  Ayesha K. ")
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Ayesha K.");
    }

    #[test]
    fn test_generate_reset_code_format() {
        for _ in 0..50 {
            let code = generate_reset_code();
            assert_eq!(code.len(), RESET_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_dummy_hash_is_a_real_argon2_hash() {
        let dummy = DUMMY_PASSWORD_HASH.as_deref().unwrap();
        assert!(PasswordHash::new(dummy).is_ok());
        assert!(matches!(
            verify_password("correct horse battery", dummy),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("a long password").unwrap();
        assert!(verify_password("a long password", &hash).is_ok());
        assert!(matches!(
            verify_password("another password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
