//! Stock count repository.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use envanter_core::models::{NewStockCount, StockCount, StockCountLine};
use envanter_core::{CountNo, CountStatus, MaterialCode};

use super::RepositoryError;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CountRow {
    seq: i64,
    created_at: DateTime<Utc>,
    location: Option<String>,
    planned_date: NaiveDate,
    note: String,
    status: CountStatus,
    created_by: String,
    completed_by: String,
    completed_at: Option<DateTime<Utc>>,
}

impl CountRow {
    fn into_count(self, lines: Vec<StockCountLine>) -> StockCount {
        StockCount {
            number: CountNo::from_sequence(self.seq),
            created_at: self.created_at,
            location: self.location,
            planned_date: self.planned_date,
            note: self.note,
            status: self.status,
            created_by: self.created_by,
            completed_by: self.completed_by,
            completed_at: self.completed_at,
            lines,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CountLineRow {
    count_seq: i64,
    material_code: String,
    material_name: String,
    expected: i64,
    counted: Option<i64>,
    difference: Option<i64>,
}

impl TryFrom<CountLineRow> for StockCountLine {
    type Error = RepositoryError;

    fn try_from(row: CountLineRow) -> Result<Self, Self::Error> {
        let material_code = MaterialCode::parse(&row.material_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid material code on count line: {e}"))
        })?;

        Ok(Self {
            material_code,
            material_name: row.material_name,
            expected: row.expected,
            counted: row.counted,
            difference: row.difference,
        })
    }
}

const COUNT_COLUMNS: &str = "seq, created_at, location, planned_date, note, status, created_by, \
                             completed_by, completed_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock counts.
pub struct StockCountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StockCountRepository<'a> {
    /// Create a new stock count repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all counts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list(&self) -> Result<Vec<StockCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, CountRow>(&format!(
            "SELECT {COUNT_COLUMNS} FROM envanter.stock_count ORDER BY seq DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.attach_lines(rows).await
    }

    /// Get a count by number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn get(&self, number: CountNo) -> Result<Option<StockCount>, RepositoryError> {
        let row = sqlx::query_as::<_, CountRow>(&format!(
            "SELECT {COUNT_COLUMNS} FROM envanter.stock_count WHERE seq = $1"
        ))
        .bind(number.sequence())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_lines(vec![row]).await?.pop())
    }

    /// Create a planned count with the given expected-quantity snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        count: &NewStockCount,
        lines: Vec<StockCountLine>,
    ) -> Result<StockCount, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CountRow>(&format!(
            r"
            INSERT INTO envanter.stock_count (location, planned_date, note, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {COUNT_COLUMNS}
            "
        ))
        .bind(count.location())
        .bind(count.planned_date)
        .bind(&count.note)
        .bind(&count.created_by)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r"
                INSERT INTO envanter.stock_count_line
                    (count_seq, material_code, material_name, expected)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(row.seq)
            .bind(line.material_code.as_str())
            .bind(&line.material_name)
            .bind(line.expected)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(row.into_count(lines))
    }

    /// Move a count to `InProgress` if it is still `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn start(
        &self,
        number: CountNo,
        from: CountStatus,
    ) -> Result<Option<StockCount>, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE envanter.stock_count SET status = $3 WHERE seq = $1 AND status = $2",
        )
        .bind(number.sequence())
        .bind(from)
        .bind(CountStatus::InProgress)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(number).await
    }

    /// Complete a count that is still `from`, storing the counted lines.
    ///
    /// Returns `None` when the count is no longer in `from`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn complete(
        &self,
        number: CountNo,
        from: CountStatus,
        completed_by: &str,
        lines: &[StockCountLine],
    ) -> Result<Option<StockCount>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r"
            UPDATE envanter.stock_count
            SET status = $3, completed_by = $4, completed_at = now()
            WHERE seq = $1 AND status = $2
            ",
        )
        .bind(number.sequence())
        .bind(from)
        .bind(CountStatus::Completed)
        .bind(completed_by)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        for line in lines.iter().filter(|l| l.counted.is_some()) {
            sqlx::query(
                r"
                UPDATE envanter.stock_count_line
                SET counted = $3, difference = $4
                WHERE count_seq = $1 AND material_code = $2
                ",
            )
            .bind(number.sequence())
            .bind(line.material_code.as_str())
            .bind(line.counted)
            .bind(line.difference)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.get(number).await
    }

    async fn attach_lines(&self, rows: Vec<CountRow>) -> Result<Vec<StockCount>, RepositoryError> {
        let seqs: Vec<i64> = rows.iter().map(|r| r.seq).collect();

        let line_rows = sqlx::query_as::<_, CountLineRow>(
            r"
            SELECT count_seq, material_code, material_name, expected, counted, difference
            FROM envanter.stock_count_line
            WHERE count_seq = ANY($1)
            ORDER BY count_seq, material_code
            ",
        )
        .bind(&seqs)
        .fetch_all(self.pool)
        .await?;

        let mut lines: HashMap<i64, Vec<StockCountLine>> = HashMap::new();
        for line in line_rows {
            let seq = line.count_seq;
            lines.entry(seq).or_default().push(line.try_into()?);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let count_lines = lines.remove(&row.seq).unwrap_or_default();
                row.into_count(count_lines)
            })
            .collect())
    }
}
