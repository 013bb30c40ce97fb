//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! envanter migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ENVANTER_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded in the
//! binary:
//! ```text
//! migrations/
//! ├── 20261001000001_create_schema_and_types.sql
//! ├── 20261001000002_create_users.sql
//! └── ...
//! ```

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use envanter_server::db;

/// Errors that can occur while connecting or migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Read the database URL from the environment.
///
/// # Errors
///
/// Returns `MigrationError::MissingEnvVar` if neither variable is set.
pub fn database_url() -> Result<SecretString, MigrationError> {
    dotenvy::dotenv().ok();

    std::env::var("ENVANTER_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("ENVANTER_DATABASE_URL"))
}

/// Connect to the database named by the environment.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing or the connection fails.
pub async fn connect() -> Result<PgPool, MigrationError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the connection or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    db::migrate(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
