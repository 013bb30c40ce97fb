//! Location repository.
//!
//! A material belongs to a location when its `location` text equals the
//! location's code or name.

use rust_decimal::Decimal;
use sqlx::PgPool;

use envanter_core::LocationCode;
use envanter_core::models::{Location, NewLocation};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    code: String,
    name: String,
    address: String,
    responsible: String,
    phone: String,
    active: bool,
    material_count: i64,
    total_value: Decimal,
}

impl TryFrom<LocationRow> for Location {
    type Error = RepositoryError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        let code = LocationCode::parse(&row.code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid location code in database: {e}"))
        })?;

        Ok(Self {
            location: NewLocation {
                code,
                name: row.name,
                address: row.address,
                responsible: row.responsible,
                phone: row.phone,
                active: row.active,
            },
            material_count: row.material_count,
            total_value: row.total_value,
        })
    }
}

const LOCATION_SELECT: &str = r"
    SELECT l.code, l.name, l.address, l.responsible, l.phone, l.active,
           COUNT(m.code)::BIGINT AS material_count,
           COALESCE(SUM(m.current_stock * m.unit_price), 0)::NUMERIC AS total_value
    FROM envanter.location l
    LEFT JOIN envanter.material_stock m
        ON m.archived_at IS NULL AND (m.location = l.code OR m.location = l.name)
";

/// Repository for storage locations.
pub struct LocationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LocationRepository<'a> {
    /// Create a new location repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List locations with their material count and stock value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list(&self) -> Result<Vec<Location>, RepositoryError> {
        let rows = sqlx::query_as::<_, LocationRow>(&format!(
            "{LOCATION_SELECT} GROUP BY l.code ORDER BY l.code"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a location by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get(&self, code: &LocationCode) -> Result<Option<Location>, RepositoryError> {
        let row = sqlx::query_as::<_, LocationRow>(&format!(
            "{LOCATION_SELECT} WHERE l.code = $1 GROUP BY l.code"
        ))
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a location.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, location: &NewLocation) -> Result<Location, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO envanter.location (code, name, address, responsible, phone, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(location.code.as_str())
        .bind(&location.name)
        .bind(&location.address)
        .bind(&location.responsible)
        .bind(&location.phone)
        .bind(location.active)
        .execute(self.pool)
        .await
        .map_err(|e| super::unique_violation(e, "location code already exists"))?;

        self.get(&location.code).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a location. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, code: &LocationCode) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM envanter.location WHERE code = $1")
            .bind(code.as_str())
            .execute(self.pool)
            .await?;

        Ok(deleted.rows_affected() > 0)
    }
}
