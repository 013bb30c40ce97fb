//! Dashboard statistics.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{Datelike, Utc};
use tracing::instrument;

use envanter_core::analytics::DashboardStats;
use envanter_core::models::{BudgetSummary, OrderFilter, RequestFilter};

use crate::db::{BudgetRepository, MaterialRepository, OrderRepository, RequestRepository};
use crate::error::AppResult;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(index))
}

#[instrument(skip_all)]
async fn index(_user: RequireUser, State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let pool = state.pool();
    let year = Utc::now().year();
    let material_repo = MaterialRepository::new(pool);
    let request_repo = RequestRepository::new(pool);
    let order_repo = OrderRepository::new(pool);
    let budget_repo = BudgetRepository::new(pool);
    let request_filter = RequestFilter::default();
    let order_filter = OrderFilter::default();

    let (materials, requests, orders, budgets) = tokio::try_join!(
        material_repo.list_all(),
        request_repo.list(&request_filter),
        order_repo.list(&order_filter),
        budget_repo.list_year(year),
    )?;

    let budget = BudgetSummary::from_budgets(year, budgets);
    Ok(Json(DashboardStats::compute(&materials, &requests, &orders, &budget)))
}
