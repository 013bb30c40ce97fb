//! Supplier repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use envanter_core::SupplierCode;
use envanter_core::models::{NewSupplier, Rating, Supplier, SupplierDetails, SupplierFilter};

use super::RepositoryError;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SupplierRow {
    code: String,
    name: String,
    contact_person: String,
    phone: String,
    email: String,
    address: String,
    category: String,
    rating: i16,
    notes: String,
    active: bool,
    order_count: i64,
    last_order_at: Option<DateTime<Utc>>,
}

impl TryFrom<SupplierRow> for Supplier {
    type Error = RepositoryError;

    fn try_from(row: SupplierRow) -> Result<Self, Self::Error> {
        let code = SupplierCode::parse(&row.code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid supplier code in database: {e}"))
        })?;
        let rating = Rating::new(i64::from(row.rating)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid supplier rating in database: {e}"))
        })?;

        Ok(Self {
            code,
            details: SupplierDetails {
                name: row.name,
                contact_person: row.contact_person,
                phone: row.phone,
                email: row.email,
                address: row.address,
                category: row.category,
                rating,
                notes: row.notes,
                active: row.active,
            },
            order_count: row.order_count,
            last_order_at: row.last_order_at,
        })
    }
}

const SUPPLIER_SELECT: &str = r"
    SELECT s.code, s.name, s.contact_person, s.phone, s.email, s.address, s.category,
           s.rating, s.notes, s.active,
           COALESCE(o.order_count, 0)::BIGINT AS order_count,
           o.last_order_at
    FROM envanter.supplier s
    LEFT JOIN (
        SELECT supplier_code, COUNT(*) AS order_count, MAX(created_at) AS last_order_at
        FROM envanter.purchase_order
        GROUP BY supplier_code
    ) o ON o.supplier_code = s.code
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for suppliers.
pub struct SupplierRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SupplierRepository<'a> {
    /// Create a new supplier repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List suppliers matching the filter, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list(&self, filter: &SupplierFilter) -> Result<Vec<Supplier>, RepositoryError> {
        let rows = sqlx::query_as::<_, SupplierRow>(&format!(
            r"
            {SUPPLIER_SELECT}
            WHERE ($1::TEXT IS NULL OR s.category = $1)
              AND ($2::BOOLEAN IS NULL OR s.active = $2)
            ORDER BY s.code
            "
        ))
        .bind(filter.category.as_deref())
        .bind(filter.active)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a supplier by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get(&self, code: &SupplierCode) -> Result<Option<Supplier>, RepositoryError> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!("{SUPPLIER_SELECT} WHERE s.code = $1"))
            .bind(code.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, supplier: &NewSupplier) -> Result<Supplier, RepositoryError> {
        let details = &supplier.details;

        sqlx::query(
            r"
            INSERT INTO envanter.supplier
                (code, name, contact_person, phone, email, address, category, rating, notes, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(supplier.code.as_str())
        .bind(&details.name)
        .bind(&details.contact_person)
        .bind(&details.phone)
        .bind(&details.email)
        .bind(&details.address)
        .bind(&details.category)
        .bind(details.rating.get())
        .bind(&details.notes)
        .bind(details.active)
        .execute(self.pool)
        .await
        .map_err(|e| super::unique_violation(e, "supplier code already exists"))?;

        self.get(&supplier.code).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace the editable fields of a supplier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the supplier does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        code: &SupplierCode,
        details: &SupplierDetails,
    ) -> Result<Supplier, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE envanter.supplier
            SET name = $2, contact_person = $3, phone = $4, email = $5, address = $6,
                category = $7, rating = $8, notes = $9, active = $10, updated_at = now()
            WHERE code = $1
            ",
        )
        .bind(code.as_str())
        .bind(&details.name)
        .bind(&details.contact_person)
        .bind(&details.phone)
        .bind(&details.email)
        .bind(&details.address)
        .bind(&details.category)
        .bind(details.rating.get())
        .bind(&details.notes)
        .bind(details.active)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(code).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a supplier. Orders keep their snapshot of the supplier.
    ///
    /// Returns `false` if the supplier did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, code: &SupplierCode) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM envanter.supplier WHERE code = $1")
            .bind(code.as_str())
            .execute(self.pool)
            .await?;

        Ok(deleted.rows_affected() > 0)
    }
}
