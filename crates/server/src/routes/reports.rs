//! Reports.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use envanter_core::models::{MaterialFilter, MovementFilter, OrderFilter, SupplierFilter};
use envanter_core::reports::{
    DepartmentConsumption, InventoryReport, MovementReport, SupplierSummary,
    department_consumption, supplier_summaries,
};
use envanter_core::{Category, MaterialCode};

use crate::db::{MaterialRepository, MovementRepository, OrderRepository, SupplierRepository};
use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Build the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/inventory", get(inventory))
        .route("/reports/movements", get(movements))
        .route("/reports/department", get(department))
        .route("/reports/suppliers", get(suppliers))
}

#[derive(Debug, Default, Deserialize)]
struct InventoryQuery {
    #[serde(rename = "kategori", default)]
    category: Option<Category>,
}

#[derive(Debug, Default, Deserialize)]
struct MovementsQuery {
    #[serde(rename = "malzeme_kodu", default)]
    material_code: Option<MaterialCode>,
}

#[derive(Debug, Default, Deserialize)]
struct DepartmentQuery {
    #[serde(rename = "departman", default)]
    department: Option<String>,
}

#[instrument(skip(_user, state))]
async fn inventory(
    _user: RequireUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<InventoryQuery>,
) -> AppResult<Json<InventoryReport>> {
    let filter = MaterialFilter {
        category: query.category,
        ..MaterialFilter::default()
    };
    let materials = MaterialRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(InventoryReport::new(materials)))
}

#[instrument(skip(_user, state))]
async fn movements(
    _user: RequireUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MovementsQuery>,
) -> AppResult<Json<MovementReport>> {
    let filter = MovementFilter {
        material_code: query.material_code,
        direction: None,
    };
    let movements = MovementRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(MovementReport::new(movements)))
}

#[instrument(skip(_user, state))]
async fn department(
    _user: RequireUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DepartmentQuery>,
) -> AppResult<Json<Vec<DepartmentConsumption>>> {
    let movements = MovementRepository::new(state.pool())
        .list(&MovementFilter::default())
        .await?;
    let department = query.department.as_deref().map(str::trim).filter(|d| !d.is_empty());
    Ok(Json(department_consumption(&movements, department)))
}

#[instrument(skip_all)]
async fn suppliers(
    _user: RequireUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<SupplierSummary>>> {
    let pool = state.pool();
    let supplier_repo = SupplierRepository::new(pool);
    let order_repo = OrderRepository::new(pool);
    let supplier_filter = SupplierFilter::default();
    let order_filter = OrderFilter::default();
    let (suppliers, orders) = tokio::try_join!(
        supplier_repo.list(&supplier_filter),
        order_repo.list(&order_filter),
    )?;
    Ok(Json(supplier_summaries(&suppliers, &orders)))
}
