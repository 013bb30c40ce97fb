//! Budget repository.
//!
//! `kalan` is not stored; it is the annual limit minus usage.

use rust_decimal::Decimal;
use sqlx::PgPool;

use envanter_core::Category;
use envanter_core::models::{Budget, NewBudget};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct BudgetRow {
    year: i32,
    category: Category,
    monthly_limit: Decimal,
    annual_limit: Decimal,
    used: Decimal,
}

impl From<BudgetRow> for Budget {
    fn from(row: BudgetRow) -> Self {
        Self {
            year: row.year,
            category: row.category,
            monthly_limit: row.monthly_limit,
            annual_limit: row.annual_limit,
            remaining: row.annual_limit - row.used,
            used: row.used,
        }
    }
}

const BUDGET_COLUMNS: &str = "year, category, monthly_limit, annual_limit, used";

/// Repository for budgets.
pub struct BudgetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BudgetRepository<'a> {
    /// Create a new budget repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Budgets of one year in category order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_year(&self, year: i32) -> Result<Vec<Budget>, RepositoryError> {
        let rows = sqlx::query_as::<_, BudgetRow>(&format!(
            "SELECT {BUDGET_COLUMNS} FROM envanter.budget WHERE year = $1 ORDER BY category"
        ))
        .bind(year)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a budget or replace its limits. Usage is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(&self, budget: &NewBudget) -> Result<Budget, RepositoryError> {
        let row = sqlx::query_as::<_, BudgetRow>(&format!(
            r"
            INSERT INTO envanter.budget (year, category, monthly_limit, annual_limit)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (year, category) DO UPDATE
            SET monthly_limit = EXCLUDED.monthly_limit,
                annual_limit = EXCLUDED.annual_limit,
                updated_at = now()
            RETURNING {BUDGET_COLUMNS}
            "
        ))
        .bind(budget.year)
        .bind(budget.category)
        .bind(budget.monthly_limit)
        .bind(budget.annual_limit)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Add spending to a budget in one statement.
    ///
    /// Returns `None` when the year has no budget for the category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn add_spend(
        &self,
        year: i32,
        category: Category,
        amount: Decimal,
    ) -> Result<Option<Budget>, RepositoryError> {
        let row = sqlx::query_as::<_, BudgetRow>(&format!(
            r"
            UPDATE envanter.budget
            SET used = used + $3, updated_at = now()
            WHERE year = $1 AND category = $2
            RETURNING {BUDGET_COLUMNS}
            "
        ))
        .bind(year)
        .bind(category)
        .bind(amount)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
