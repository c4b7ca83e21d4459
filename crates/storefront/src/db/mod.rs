//! Data access for the storefront.
//!
//! # Database: `stitchline`
//!
//! ## Tables
//!
//! - `users` - Accounts, roles, contact details and password reset codes
//! - `product_categories` / `design_categories` - Catalog taxonomies
//! - `products` - Catalog items with ordered image URLs
//! - `cart_items` - One row per "add to cart", owned by a user
//! - `orders` - Denormalized order lines written at checkout
//! - `reviews` - Product ratings and comments
//! - `notifications` - Global admin notices
//! - `tower_sessions.session` - Session storage
//!
//! Every resource is reached through an `async_trait` repository trait so
//! services can run against [`PgStore`] in production and
//! [`memory::MemoryStore`] in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p stitchline-cli -- migrate
//! ```

pub mod cart;
pub mod catalog;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod notifications;
pub mod orders;
pub mod reviews;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use catalog::{CategoryRepository, ProductRepository};
pub use notifications::NotificationRepository;
pub use orders::OrderRepository;
pub use reviews::ReviewRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (unique email, category still in use).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign-key violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_constraint(e: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// `PostgreSQL` implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Handles to every repository, shared by all requests.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub cart: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    /// Use one store for every resource.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + ProductRepository
            + CategoryRepository
            + CartRepository
            + OrderRepository
            + ReviewRepository
            + NotificationRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            products: store.clone(),
            categories: store.clone(),
            cart: store.clone(),
            orders: store.clone(),
            reviews: store.clone(),
            notifications: store,
        }
    }

    /// Repositories backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }
}
