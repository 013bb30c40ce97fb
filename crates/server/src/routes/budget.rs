//! Yearly category budgets and recorded spending.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{Datelike, Utc};
use tracing::instrument;

use envanter_core::models::{
    Budget, BudgetQuery, BudgetSpend, BudgetSummary, NewAuditEntry, NewBudget, NewNotification,
};
use envanter_core::{AuditAction, AuditModule, Validate};

use crate::db::BudgetRepository;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::middleware::{RequireAdmin, RequireUser, RequireWriter};
use crate::services::{audit, notify};
use crate::state::AppState;

/// Build the budget router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/budget", get(summary).post(set_limits))
        .route("/budget/update", post(record_spend))
}

#[instrument(skip_all)]
async fn summary(
    _user: RequireUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BudgetQuery>,
) -> AppResult<Json<BudgetSummary>> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let budgets = BudgetRepository::new(state.pool()).list_year(year).await?;
    Ok(Json(BudgetSummary::from_budgets(year, budgets)))
}

#[instrument(skip_all, fields(yil = budget.year, kategori = %budget.category))]
async fn set_limits(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppJson(budget): AppJson<NewBudget>,
) -> AppResult<Json<Budget>> {
    budget.validate()?;
    let stored = BudgetRepository::new(state.pool()).upsert(&budget).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &admin.user.username,
            AuditAction::Update,
            AuditModule::Budget,
            format!("{}/{}", stored.year, stored.category),
        )
        .change("", audit::snapshot(&stored)),
    )
    .await;

    Ok(Json(stored))
}

/// Add spending to a category. Passing the annual limit notifies admins.
#[instrument(skip_all, fields(yil = spend.year, kategori = %spend.category, harcama = %spend.amount))]
async fn record_spend(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    AppQuery(spend): AppQuery<BudgetSpend>,
) -> AppResult<Json<Budget>> {
    if !session.user.role.can_review_requests() {
        return Err(AppError::Forbidden(
            "Only admins and managers can record spending".to_string(),
        ));
    }
    spend.validate()?;

    let budget = BudgetRepository::new(state.pool())
        .add_spend(spend.year, spend.category, spend.amount)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("budget {} for {}", spend.category, spend.year))
        })?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Update,
            AuditModule::Budget,
            format!("{}/{}", budget.year, budget.category),
        )
        .change(
            (budget.used - spend.amount).to_string(),
            budget.used.to_string(),
        ),
    )
    .await;

    if let Some(warning) = NewNotification::budget_overrun(&budget) {
        tracing::warn!(remaining = %budget.remaining, "Budget limit exceeded");
        notify::send(state.pool(), warning).await;
    }

    Ok(Json(budget))
}
