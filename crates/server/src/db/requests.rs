//! Material request repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use envanter_core::models::{MaterialRequest, NewMaterialRequest, RequestFilter};
use envanter_core::{MaterialCode, Priority, Quantity, RequestNo, RequestStatus};

use super::RepositoryError;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    seq: i64,
    created_at: DateTime<Utc>,
    material_code: String,
    material_name: String,
    quantity: Quantity,
    priority: Priority,
    note: String,
    requester: String,
    department: String,
    status: RequestStatus,
    reviewed_by: String,
    reviewed_at: Option<DateTime<Utc>>,
    rejection_reason: String,
}

impl TryFrom<RequestRow> for MaterialRequest {
    type Error = RepositoryError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let material_code = MaterialCode::parse(&row.material_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid material code on request: {e}"))
        })?;

        Ok(Self {
            number: RequestNo::from_sequence(row.seq),
            created_at: row.created_at,
            material_code,
            material_name: row.material_name,
            quantity: row.quantity,
            priority: row.priority,
            note: row.note,
            requester: row.requester,
            department: row.department,
            status: row.status,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            rejection_reason: row.rejection_reason,
        })
    }
}

const REQUEST_COLUMNS: &str = "seq, created_at, material_code, material_name, quantity, priority, \
                               note, requester, department, status, reviewed_by, reviewed_at, \
                               rejection_reason";

// =============================================================================
// Repository
// =============================================================================

/// Repository for material requests.
pub struct RequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RequestRepository<'a> {
    /// Create a new request repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List requests matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list(&self, filter: &RequestFilter) -> Result<Vec<MaterialRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            r"
            SELECT {REQUEST_COLUMNS}
            FROM envanter.material_request
            WHERE ($1::envanter.request_status IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR department = $2)
            ORDER BY seq DESC
            "
        ))
        .bind(filter.status)
        .bind(filter.department.as_deref())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a request by number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get(&self, number: RequestNo) -> Result<Option<MaterialRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM envanter.material_request WHERE seq = $1"
        ))
        .bind(number.sequence())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a pending request. The number is assigned by the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the material does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, request: &NewMaterialRequest) -> Result<MaterialRequest, RepositoryError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            r"
            INSERT INTO envanter.material_request
                (material_code, material_name, quantity, priority, note, requester, department)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {REQUEST_COLUMNS}
            "
        ))
        .bind(request.material_code.as_str())
        .bind(&request.material_name)
        .bind(request.quantity)
        .bind(request.priority)
        .bind(&request.note)
        .bind(&request.requester)
        .bind(&request.department)
        .fetch_one(self.pool)
        .await
        .map_err(super::missing_reference)?;

        row.try_into()
    }

    /// Move a request from `from` to `to`, recording the reviewer.
    ///
    /// Returns `None` when the request is no longer in `from`, which happens
    /// when a concurrent review won.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn review(
        &self,
        number: RequestNo,
        from: RequestStatus,
        to: RequestStatus,
        reviewer: &str,
        rejection_reason: &str,
    ) -> Result<Option<MaterialRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            r"
            UPDATE envanter.material_request
            SET status = $3, reviewed_by = $4, reviewed_at = now(), rejection_reason = $5
            WHERE seq = $1 AND status = $2
            RETURNING {REQUEST_COLUMNS}
            "
        ))
        .bind(number.sequence())
        .bind(from)
        .bind(to)
        .bind(reviewer)
        .bind(rejection_reason)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
