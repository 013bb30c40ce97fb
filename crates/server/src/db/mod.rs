//! Database operations for Envanter `PostgreSQL`.
//!
//! # Schema: `envanter`
//!
//! ## Tables
//!
//! - `app_user` - Users with salted password hashes
//! - `material` - Material master data (stock is never stored)
//! - `movement` - Append-only stock ledger
//! - `material_request` - Replenishment requests (`TLP` numbers)
//! - `supplier` - Suppliers
//! - `purchase_order`, `order_line` - Purchase orders (`SIP` numbers)
//! - `location` - Storage locations
//! - `stock_count`, `stock_count_line` - Planned counts (`SAY` numbers)
//! - `audit_log` - One row per mutation
//! - `notification` - In-app notifications
//! - `budget` - Yearly spending limits per category
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p envanter-cli -- migrate
//! ```

pub mod audit;
pub mod budgets;
pub mod locations;
pub mod materials;
pub mod movements;
pub mod notifications;
pub mod orders;
pub mod requests;
pub mod stock_counts;
pub mod suppliers;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use audit::AuditRepository;
pub use budgets::BudgetRepository;
pub use locations::LocationRepository;
pub use materials::MaterialRepository;
pub use movements::MovementRepository;
pub use notifications::NotificationRepository;
pub use orders::OrderRepository;
pub use requests::RequestRepository;
pub use stock_counts::StockCountRepository;
pub use suppliers::SupplierRepository;
pub use users::UserRepository;

/// Migrations embedded from `crates/server/migrations`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

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

    /// Constraint violation or a concurrent state change.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Map a unique violation to `Conflict` with the given message.
pub(crate) fn unique_violation(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Map a foreign key violation to `NotFound`.
pub(crate) fn missing_reference(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
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

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails to apply.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
