//! Purchase order repository.
//!
//! Orders and their lines are stored in two tables and reassembled on read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use envanter_core::models::{NewOrder, OrderFilter, OrderLine, PurchaseOrder, order_total};
use envanter_core::{MaterialCode, OrderNo, OrderStatus, Quantity, SupplierCode};

use super::RepositoryError;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    seq: i64,
    created_at: DateTime<Utc>,
    supplier_code: String,
    supplier_name: String,
    notes: String,
    total: Decimal,
    status: OrderStatus,
    created_by: String,
    approved_by: String,
    delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    order_seq: i64,
    material_code: String,
    material_name: String,
    quantity: Quantity,
    unit_price: Decimal,
    total: Decimal,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        let material_code = MaterialCode::parse(&row.material_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid material code on order line: {e}"))
        })?;

        Ok(Self {
            material_code,
            material_name: row.material_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total: row.total,
        })
    }
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<PurchaseOrder, RepositoryError> {
        let supplier_code = SupplierCode::parse(&self.supplier_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid supplier code on order: {e}"))
        })?;

        Ok(PurchaseOrder {
            number: OrderNo::from_sequence(self.seq),
            created_at: self.created_at,
            supplier_code,
            supplier_name: self.supplier_name,
            lines,
            notes: self.notes,
            total: self.total,
            status: self.status,
            created_by: self.created_by,
            approved_by: self.approved_by,
            delivered_at: self.delivered_at,
        })
    }
}

const ORDER_COLUMNS: &str = "seq, created_at, supplier_code, supplier_name, notes, total, status, \
                             created_by, approved_by, delivered_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for purchase orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<PurchaseOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM envanter.purchase_order
            WHERE ($1::envanter.order_status IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR supplier_code = $2)
            ORDER BY seq DESC
            "
        ))
        .bind(filter.status)
        .bind(filter.supplier_code.as_ref().map(SupplierCode::as_str))
        .fetch_all(self.pool)
        .await?;

        self.attach_lines(rows).await
    }

    /// Get an order by number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn get(&self, number: OrderNo) -> Result<Option<PurchaseOrder>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM envanter.purchase_order WHERE seq = $1"
        ))
        .bind(number.sequence())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_lines(vec![row]).await?.pop())
    }

    /// Create an order awaiting approval with its total computed from the lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(&self, order: &NewOrder) -> Result<PurchaseOrder, RepositoryError> {
        let lines = order.priced_lines();
        let total = order_total(&lines);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO envanter.purchase_order (supplier_code, supplier_name, notes, total, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.supplier_code.as_str())
        .bind(&order.supplier_name)
        .bind(&order.notes)
        .bind(total)
        .bind(&order.created_by)
        .fetch_one(&mut *tx)
        .await?;

        for (line_no, line) in (1_i32..).zip(&lines) {
            sqlx::query(
                r"
                INSERT INTO envanter.order_line
                    (order_seq, line_no, material_code, material_name, quantity, unit_price, total)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(row.seq)
            .bind(line_no)
            .bind(line.material_code.as_str())
            .bind(&line.material_name)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.total)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        row.into_order(lines)
    }

    /// Move an order from `from` to `to`.
    ///
    /// A non-empty `approver` is recorded; reaching `Delivered` stamps the
    /// delivery time. Returns `None` when the order is no longer in `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn set_status(
        &self,
        number: OrderNo,
        from: OrderStatus,
        to: OrderStatus,
        approver: &str,
    ) -> Result<Option<PurchaseOrder>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE envanter.purchase_order
            SET status = $3,
                approved_by = CASE WHEN $4 = '' THEN approved_by ELSE $4 END,
                delivered_at = CASE WHEN $3 = 'delivered' THEN now() ELSE delivered_at END
            WHERE seq = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(number.sequence())
        .bind(from)
        .bind(to)
        .bind(approver)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_lines(vec![row]).await?.pop())
    }

    async fn attach_lines(&self, rows: Vec<OrderRow>) -> Result<Vec<PurchaseOrder>, RepositoryError> {
        let seqs: Vec<i64> = rows.iter().map(|r| r.seq).collect();

        let line_rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT order_seq, material_code, material_name, quantity, unit_price, total
            FROM envanter.order_line
            WHERE order_seq = ANY($1)
            ORDER BY order_seq, line_no
            ",
        )
        .bind(&seqs)
        .fetch_all(self.pool)
        .await?;

        let mut lines: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for line in line_rows {
            let seq = line.order_seq;
            lines.entry(seq).or_default().push(line.try_into()?);
        }

        rows.into_iter()
            .map(|row| {
                let order_lines = lines.remove(&row.seq).unwrap_or_default();
                row.into_order(order_lines)
            })
            .collect()
    }
}
