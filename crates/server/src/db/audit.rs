//! Audit log repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use envanter_core::models::{AuditEntry, AuditFilter, NewAuditEntry};
use envanter_core::{AuditAction, AuditEntryId, AuditModule};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: i64,
    recorded_at: DateTime<Utc>,
    username: String,
    action: AuditAction,
    module: AuditModule,
    record_id: String,
    old_value: String,
    new_value: String,
    detail: String,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        Self {
            id: AuditEntryId::new(row.id),
            recorded_at: row.recorded_at,
            user: row.username,
            action: row.action,
            module: row.module,
            record_id: row.record_id,
            old_value: row.old_value,
            new_value: row.new_value,
            detail: row.detail,
        }
    }
}

/// Repository for audit entries.
pub struct AuditRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(&self, entry: &NewAuditEntry) -> Result<AuditEntryId, RepositoryError> {
        let id = sqlx::query_scalar::<_, i64>(
            r"
            INSERT INTO envanter.audit_log
                (username, action, module, record_id, old_value, new_value, detail)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&entry.user)
        .bind(entry.action)
        .bind(entry.module)
        .bind(&entry.record_id)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(&entry.detail)
        .fetch_one(self.pool)
        .await?;

        Ok(AuditEntryId::new(id))
    }

    /// List entries newest first, limited by the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r"
            SELECT id, recorded_at, username, action, module, record_id, old_value, new_value, detail
            FROM envanter.audit_log
            WHERE ($1::envanter.audit_module IS NULL OR module = $1)
              AND ($2::TEXT IS NULL OR username = $2)
            ORDER BY recorded_at DESC, id DESC
            LIMIT $3
            ",
        )
        .bind(filter.module)
        .bind(filter.user.as_deref())
        .bind(filter.effective_limit())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
