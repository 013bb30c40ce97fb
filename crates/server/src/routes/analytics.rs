//! Analytics and depletion predictions.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{Duration, Utc};
use tracing::instrument;

use envanter_core::analytics::{
    self, CONSUMPTION_WINDOW_DAYS, CategoryShare, MONTHLY_STATS_MONTHS, MonthlyTotals,
    StockPrediction, TrendSeries,
};
use envanter_core::models::MovementFilter;

use crate::db::{MaterialRepository, MovementRepository};
use crate::error::AppResult;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Build the analytics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analytics/trends", get(trends))
        .route("/analytics/category", get(category))
        .route("/analytics/monthly", get(monthly))
        .route("/predictions", get(predictions))
}

#[instrument(skip_all)]
async fn trends(_user: RequireUser, State(state): State<AppState>) -> AppResult<Json<TrendSeries>> {
    let movements = MovementRepository::new(state.pool())
        .list(&MovementFilter::default())
        .await?;
    Ok(Json(analytics::trends(&movements)))
}

#[instrument(skip_all)]
async fn category(
    _user: RequireUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CategoryShare>>> {
    let materials = MaterialRepository::new(state.pool()).list_all().await?;
    Ok(Json(analytics::category_breakdown(&materials)))
}

#[instrument(skip_all)]
async fn monthly(
    _user: RequireUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<MonthlyTotals>>> {
    let movements = MovementRepository::new(state.pool())
        .list(&MovementFilter::default())
        .await?;
    Ok(Json(analytics::monthly_totals(&movements, MONTHLY_STATS_MONTHS)))
}

#[instrument(skip_all)]
async fn predictions(
    _user: RequireUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<StockPrediction>>> {
    let now = Utc::now();
    let pool = state.pool();
    let material_repo = MaterialRepository::new(pool);
    let movement_repo = MovementRepository::new(pool);
    let since = now - Duration::days(CONSUMPTION_WINDOW_DAYS);
    let (materials, movements) =
        tokio::try_join!(material_repo.list_all(), movement_repo.list_since(since))?;
    Ok(Json(analytics::predict_depletion(&materials, &movements, now)))
}
