//! Purchase orders.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::instrument;

use envanter_core::models::{
    NewAuditEntry, NewNotification, NewOrder, OrderFilter, OrderStatusQuery, PurchaseOrder,
};
use envanter_core::{AuditAction, AuditModule, OrderNo, OrderStatus, Validate};

use crate::db::{OrderRepository, SupplierRepository};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::middleware::{RequireUser, RequireWriter};
use crate::services::{audit, notify};
use crate::state::AppState;

use super::actor_or;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list).post(create))
        .route("/orders/{no}", get(show))
        .route("/orders/{no}/status", put(update_status))
}

#[instrument(skip_all)]
async fn list(
    _user: RequireUser,
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<OrderFilter>,
) -> AppResult<Json<Vec<PurchaseOrder>>> {
    Ok(Json(OrderRepository::new(state.pool()).list(&filter).await?))
}

#[instrument(skip(_user, state))]
async fn show(
    _user: RequireUser,
    State(state): State<AppState>,
    Path(no): Path<String>,
) -> AppResult<Json<PurchaseOrder>> {
    let number = OrderNo::parse(&no)?;
    OrderRepository::new(state.pool())
        .get(number)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {number}")))
}

#[instrument(skip_all, fields(tedarikci = %order.supplier_code, kalemler = order.lines.len()))]
async fn create(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    AppJson(mut order): AppJson<NewOrder>,
) -> AppResult<(StatusCode, Json<PurchaseOrder>)> {
    order.validate()?;
    order.created_by = actor_or(&order.created_by, &session);
    if order.supplier_name.trim().is_empty()
        && let Some(supplier) = SupplierRepository::new(state.pool())
            .get(&order.supplier_code)
            .await?
    {
        order.supplier_name = supplier.details.name;
    }

    let created = OrderRepository::new(state.pool()).create(&order).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Create,
            AuditModule::Order,
            created.number.to_string(),
        )
        .change("", created.total.to_string()),
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Move an order one step forward. Only the immediate successor is accepted.
#[instrument(skip(session, state, query), fields(durum = %query.status))]
async fn update_status(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    Path(no): Path<String>,
    AppQuery(query): AppQuery<OrderStatusQuery>,
) -> AppResult<Json<PurchaseOrder>> {
    let number = OrderNo::parse(&no)?;
    let repo = OrderRepository::new(state.pool());
    let current = repo
        .get(number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {number}")))?;

    let target: OrderStatus = current.status.advance_to(query.status)?;
    let approver = match target {
        OrderStatus::Approved => actor_or(&query.approver, &session),
        _ => query.approver.trim().to_owned(),
    };

    let updated = repo
        .set_status(number, current.status, target, &approver)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("order {number} changed concurrently")))?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Update,
            AuditModule::Order,
            number.to_string(),
        )
        .change(current.status.label(), updated.status.label()),
    )
    .await;
    notify::send(state.pool(), NewNotification::order_updated(&updated)).await;

    Ok(Json(updated))
}
