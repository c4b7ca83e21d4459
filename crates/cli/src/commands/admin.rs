//! Admin account management commands.
//!
//! Signup always creates `user` accounts, so admins are made here.
//!
//! # Usage
//!
//! ```bash
//! sl-cli admin create -e admin@example.com -n "Admin Name" -p "long password"
//! sl-cli admin promote -e someone@example.com
//! ```

use stitchline_core::{Email, Role, UserId};
use stitchline_storefront::db::Repositories;
use stitchline_storefront::models::NewUser;
use stitchline_storefront::services::auth::{AuthError, hash_password, validate_password};

use super::{CommandError, connect};

/// Create a new admin account.
///
/// # Returns
///
/// The ID of the created account.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, CommandError> {
    let email = Email::parse(email).map_err(AuthError::from)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::MissingField("name").into());
    }
    validate_password(password)?;

    let repos = Repositories::postgres(connect().await?);

    if repos.users.get_credentials(&email).await?.is_some() {
        return Err(CommandError::UserExists(email.to_string()));
    }

    tracing::info!("Creating admin user: {email}");
    let user = repos
        .users
        .create(&NewUser {
            email,
            password_hash: hash_password(password)?,
            full_name: name.to_owned(),
            role: Role::Admin,
            phone_number: None,
            alt_phone_number: None,
            address: None,
            city: None,
        })
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}

/// Give an existing account the admin role.
pub async fn promote(email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(AuthError::from)?;
    let repos = Repositories::postgres(connect().await?);

    let (user, _) = repos
        .users
        .get_credentials(&email)
        .await?
        .ok_or_else(|| CommandError::UserNotFound(email.to_string()))?;

    if user.role.is_admin() {
        tracing::info!("{email} is already an admin");
        return Ok(());
    }

    repos.users.set_role(user.id, Role::Admin).await?;
    tracing::info!("Promoted {email} (ID {}) to admin", user.id);
    Ok(())
}
