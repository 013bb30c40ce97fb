//! Audit trail for mutations.

use serde::Serialize;
use sqlx::PgPool;

use envanter_core::models::NewAuditEntry;

use crate::db::AuditRepository;

/// Write an audit entry.
///
/// The mutation has already been committed when this runs, so a failure is
/// logged rather than reported to the caller.
pub async fn record(pool: &PgPool, entry: NewAuditEntry) {
    if let Err(e) = AuditRepository::new(pool).record(&entry).await {
        tracing::error!(
            error = %e,
            action = %entry.action,
            module = %entry.module,
            record_id = %entry.record_id,
            "Failed to write audit entry"
        );
    }
}

/// JSON snapshot of a value for the old/new columns.
#[must_use]
pub fn snapshot<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
