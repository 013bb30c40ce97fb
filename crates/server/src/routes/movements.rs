//! Stock movements (the ledger).

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use envanter_core::models::{Movement, MovementFilter, NewAuditEntry, NewMovement, NewNotification};
use envanter_core::{AuditAction, AuditModule, Validate};

use crate::db::{MaterialRepository, MovementRepository};
use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::middleware::{RequireUser, RequireWriter};
use crate::services::{audit, notify};
use crate::state::AppState;

use super::actor_or;

/// Build the movements router.
pub fn router() -> Router<AppState> {
    Router::new().route("/movements", get(list).post(record))
}

#[instrument(skip_all)]
async fn list(
    _user: RequireUser,
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<MovementFilter>,
) -> AppResult<Json<Vec<Movement>>> {
    Ok(Json(MovementRepository::new(state.pool()).list(&filter).await?))
}

#[instrument(
    skip_all,
    fields(kod = %movement.material_code, islem = %movement.direction, miktar = %movement.quantity)
)]
async fn record(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    AppJson(mut movement): AppJson<NewMovement>,
) -> AppResult<(StatusCode, Json<Movement>)> {
    movement.validate()?;
    movement.approved_by = actor_or(&movement.approved_by, &session);

    let recorded = MovementRepository::new(state.pool()).record(&movement).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::from(recorded.direction),
            AuditModule::Movement,
            recorded.material_code.as_str(),
        )
        .change("", recorded.quantity.to_string())
        .detail(recorded.note.clone()),
    )
    .await;

    let material = MaterialRepository::new(state.pool())
        .get(&recorded.material_code)
        .await?;
    if let Some(material) = material.filter(|m| m.is_critical()) {
        notify::send(state.pool(), NewNotification::critical_stock(&material)).await;
    }

    Ok((StatusCode::CREATED, Json(recorded)))
}
