//! Material repository.
//!
//! Reads go through the `envanter.material_stock` view, which derives the
//! current stock from the ledger. Writes never touch stock except for the
//! opening balance of a new material, which is recorded as a movement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use envanter_core::models::{Material, MaterialDetails, MaterialFilter, NewMaterial, NewMovement};
use envanter_core::{Category, MaterialCode, MovementDirection, Quantity, Unit};

use super::RepositoryError;
use super::movements::insert_movement;

/// Note recorded on the opening movement of a new material.
pub const OPENING_BALANCE_NOTE: &str = "Açılış stoku";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct MaterialRow {
    code: String,
    name: String,
    category: Category,
    unit: Unit,
    min_level: i32,
    max_level: i32,
    location: String,
    shelf: String,
    barcode: String,
    unit_price: Decimal,
    current_stock: i64,
    last_updated: Option<DateTime<Utc>>,
}

impl TryFrom<MaterialRow> for Material {
    type Error = RepositoryError;

    fn try_from(row: MaterialRow) -> Result<Self, Self::Error> {
        let code = MaterialCode::parse(&row.code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid material code in database: {e}"))
        })?;

        let details = MaterialDetails {
            name: row.name,
            category: row.category,
            unit: row.unit,
            min_level: row.min_level,
            max_level: row.max_level,
            location: row.location,
            shelf: row.shelf,
            barcode: row.barcode,
            unit_price: row.unit_price,
        };

        Ok(Self::from_details(code, details, row.current_stock, row.last_updated))
    }
}

const MATERIAL_COLUMNS: &str = "code, name, category, unit, min_level, max_level, location, \
                                shelf, barcode, unit_price, current_stock, last_updated";

/// Whether a code is free, in use, or held by an archived material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeState {
    Free,
    Active,
    Archived,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for materials.
pub struct MaterialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MaterialRepository<'a> {
    /// Create a new material repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active materials matching the filter, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list(&self, filter: &MaterialFilter) -> Result<Vec<Material>, RepositoryError> {
        let rows = sqlx::query_as::<_, MaterialRow>(&format!(
            r"
            SELECT {MATERIAL_COLUMNS}
            FROM envanter.material_stock
            WHERE archived_at IS NULL
              AND ($1::envanter.material_category IS NULL OR category = $1)
            ORDER BY code
            "
        ))
        .bind(filter.category)
        .fetch_all(self.pool)
        .await?;

        let materials = rows
            .into_iter()
            .map(Material::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(materials.into_iter().filter(|m| filter.matches(m)).collect())
    }

    /// List every active material.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list_all(&self) -> Result<Vec<Material>, RepositoryError> {
        self.list(&MaterialFilter::default()).await
    }

    /// Materials whose stock is at or below their minimum level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list_critical(&self) -> Result<Vec<Material>, RepositoryError> {
        let rows = sqlx::query_as::<_, MaterialRow>(&format!(
            r"
            SELECT {MATERIAL_COLUMNS}
            FROM envanter.material_stock
            WHERE archived_at IS NULL AND current_stock <= min_level
            ORDER BY current_stock, code
            "
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an active material by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get(&self, code: &MaterialCode) -> Result<Option<Material>, RepositoryError> {
        let row = sqlx::query_as::<_, MaterialRow>(&format!(
            r"
            SELECT {MATERIAL_COLUMNS}
            FROM envanter.material_stock
            WHERE code = $1 AND archived_at IS NULL
            "
        ))
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Whether a code can be used for a new material.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn code_state(&self, code: &MaterialCode) -> Result<CodeState, RepositoryError> {
        let archived = sqlx::query_scalar::<_, bool>(
            "SELECT archived_at IS NOT NULL FROM envanter.material WHERE code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(match archived {
            None => CodeState::Free,
            Some(false) => CodeState::Active,
            Some(true) => CodeState::Archived,
        })
    }

    /// Create a material, recording a non-zero opening stock as an `In` movement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is already used, including by an
    /// archived material.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        material: &NewMaterial,
        recorded_by: &str,
    ) -> Result<Material, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let details = &material.details;

        sqlx::query(
            r"
            INSERT INTO envanter.material
                (code, name, category, unit, min_level, max_level, location, shelf, barcode, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(material.code.as_str())
        .bind(&details.name)
        .bind(details.category)
        .bind(details.unit)
        .bind(details.min_level)
        .bind(details.max_level)
        .bind(&details.location)
        .bind(&details.shelf)
        .bind(&details.barcode)
        .bind(details.unit_price)
        .execute(&mut *tx)
        .await
        .map_err(|e| super::unique_violation(e, "material code already exists"))?;

        if material.opening_stock > 0 {
            let quantity = Quantity::new(material.opening_stock)
                .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
            let opening = NewMovement {
                material_code: material.code.clone(),
                direction: MovementDirection::In,
                quantity,
                counterparty: String::new(),
                note: OPENING_BALANCE_NOTE.to_owned(),
                order_no: None,
                approved_by: recorded_by.to_owned(),
            };
            insert_movement(&mut *tx, &opening).await?;
        }

        let row = sqlx::query_as::<_, MaterialRow>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM envanter.material_stock WHERE code = $1"
        ))
        .bind(material.code.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Replace the descriptive fields of a material. Stock is untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the material does not exist or is archived.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        code: &MaterialCode,
        details: &MaterialDetails,
    ) -> Result<Material, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE envanter.material
            SET name = $2, category = $3, unit = $4, min_level = $5, max_level = $6,
                location = $7, shelf = $8, barcode = $9, unit_price = $10, updated_at = now()
            WHERE code = $1 AND archived_at IS NULL
            ",
        )
        .bind(code.as_str())
        .bind(&details.name)
        .bind(details.category)
        .bind(details.unit)
        .bind(details.min_level)
        .bind(details.max_level)
        .bind(&details.location)
        .bind(&details.shelf)
        .bind(&details.barcode)
        .bind(details.unit_price)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(code).await?.ok_or(RepositoryError::NotFound)
    }

    /// Archive a material. Its ledger entries are kept and the code stays reserved.
    ///
    /// Returns the archived material, or `None` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn archive(&self, code: &MaterialCode) -> Result<Option<Material>, RepositoryError> {
        let Some(material) = self.get(code).await? else {
            return Ok(None);
        };

        let archived = sqlx::query(
            r"
            UPDATE envanter.material
            SET archived_at = now(), updated_at = now()
            WHERE code = $1 AND archived_at IS NULL
            ",
        )
        .bind(code.as_str())
        .execute(self.pool)
        .await?;

        Ok((archived.rows_affected() > 0).then_some(material))
    }
}
