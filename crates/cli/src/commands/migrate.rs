//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! sl-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Schema files live in `crates/storefront/migrations/`. The session table
//! belongs to `tower-sessions-sqlx-store` and is created by its own migration.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Apply pending schema migrations and create the session table.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
