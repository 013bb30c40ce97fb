//! Stock ledger repository.
//!
//! Movements are only ever inserted. Each insert locks the material row and
//! re-derives its stock inside the same transaction, so concurrent outgoing
//! movements cannot overdraw a material.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use envanter_core::ledger;
use envanter_core::models::{Movement, MovementFilter, NewMovement};
use envanter_core::{MaterialCode, MovementDirection, MovementId, OrderNo, Quantity};

use super::RepositoryError;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: i64,
    recorded_at: DateTime<Utc>,
    material_code: String,
    direction: MovementDirection,
    quantity: Quantity,
    counterparty: String,
    note: String,
    order_no: Option<String>,
    approved_by: String,
}

impl TryFrom<MovementRow> for Movement {
    type Error = RepositoryError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let material_code = MaterialCode::parse(&row.material_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid material code in ledger: {e}"))
        })?;
        let order_no = row
            .order_no
            .as_deref()
            .map(OrderNo::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid order number in ledger: {e}"))
            })?;

        Ok(Self {
            id: MovementId::new(row.id),
            recorded_at: row.recorded_at,
            material_code,
            direction: row.direction,
            quantity: row.quantity,
            counterparty: row.counterparty,
            note: row.note,
            order_no,
            approved_by: row.approved_by,
        })
    }
}

const MOVEMENT_COLUMNS: &str = "id, recorded_at, material_code, direction, quantity, \
                                counterparty, note, order_no, approved_by";

/// Append a movement on an open connection without checking the balance.
///
/// Callers must hold the material row lock when the movement is outgoing.
pub(crate) async fn insert_movement(
    conn: &mut PgConnection,
    movement: &NewMovement,
) -> Result<Movement, RepositoryError> {
    let row = sqlx::query_as::<_, MovementRow>(&format!(
        r"
        INSERT INTO envanter.movement
            (material_code, direction, quantity, counterparty, note, order_no, approved_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {MOVEMENT_COLUMNS}
        "
    ))
    .bind(movement.material_code.as_str())
    .bind(movement.direction)
    .bind(movement.quantity)
    .bind(&movement.counterparty)
    .bind(&movement.note)
    .bind(movement.order_no.map(|n| n.to_string()))
    .bind(&movement.approved_by)
    .fetch_one(&mut *conn)
    .await
    .map_err(super::missing_reference)?;

    row.try_into()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the stock ledger.
pub struct MovementRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MovementRepository<'a> {
    /// Create a new movement repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List movements, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list(&self, filter: &MovementFilter) -> Result<Vec<Movement>, RepositoryError> {
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            r"
            SELECT {MOVEMENT_COLUMNS}
            FROM envanter.movement
            WHERE ($1::TEXT IS NULL OR material_code = $1)
              AND ($2::envanter.movement_direction IS NULL OR direction = $2)
            ORDER BY recorded_at DESC, id DESC
            "
        ))
        .bind(filter.material_code.as_ref().map(MaterialCode::as_str))
        .bind(filter.direction)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List movements recorded at or after `since`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<Movement>, RepositoryError> {
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            r"
            SELECT {MOVEMENT_COLUMNS}
            FROM envanter.movement
            WHERE recorded_at >= $1
            ORDER BY recorded_at DESC, id DESC
            "
        ))
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Record a movement after checking it keeps the stock non-negative.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the material does not exist or is archived.
    /// Returns `RepositoryError::Conflict` if an outgoing movement exceeds the stock.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn record(&self, movement: &NewMovement) -> Result<Movement, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, String>(
            r"
            SELECT code FROM envanter.material
            WHERE code = $1 AND archived_at IS NULL
            FOR UPDATE
            ",
        )
        .bind(movement.material_code.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let current = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COALESCE(SUM(CASE direction WHEN 'in' THEN quantity ELSE -quantity END), 0)::BIGINT
            FROM envanter.movement
            WHERE material_code = $1
            ",
        )
        .bind(movement.material_code.as_str())
        .fetch_one(&mut *tx)
        .await?;

        ledger::apply(current, movement.direction, movement.quantity)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        let recorded = insert_movement(&mut *tx, movement).await?;
        tx.commit().await?;

        Ok(recorded)
    }
}
