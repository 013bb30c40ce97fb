//! Suppliers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use envanter_core::models::{
    Message, NewAuditEntry, NewSupplier, Supplier, SupplierDetails, SupplierFilter,
};
use envanter_core::{AuditAction, AuditModule, SupplierCode, Validate};

use crate::db::SupplierRepository;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::middleware::{RequireUser, RequireWriter};
use crate::services::audit;
use crate::state::AppState;

/// Build the suppliers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list).post(create))
        .route("/suppliers/{kod}", get(show).put(update).delete(remove))
}

#[instrument(skip_all)]
async fn list(
    _user: RequireUser,
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<SupplierFilter>,
) -> AppResult<Json<Vec<Supplier>>> {
    Ok(Json(SupplierRepository::new(state.pool()).list(&filter).await?))
}

#[instrument(skip(_user, state))]
async fn show(
    _user: RequireUser,
    State(state): State<AppState>,
    Path(kod): Path<String>,
) -> AppResult<Json<Supplier>> {
    let code = SupplierCode::parse(&kod)?;
    SupplierRepository::new(state.pool())
        .get(&code)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("supplier {code}")))
}

#[instrument(skip_all, fields(kod = %supplier.code))]
async fn create(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    AppJson(supplier): AppJson<NewSupplier>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    supplier.validate()?;
    let created = SupplierRepository::new(state.pool()).create(&supplier).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Create,
            AuditModule::Supplier,
            created.code.as_str(),
        )
        .change("", audit::snapshot(&created.details)),
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(session, state, details))]
async fn update(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    Path(kod): Path<String>,
    AppJson(details): AppJson<SupplierDetails>,
) -> AppResult<Json<Supplier>> {
    let code = SupplierCode::parse(&kod)?;
    details.validate()?;
    let repo = SupplierRepository::new(state.pool());

    let before = repo
        .get(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("supplier {code}")))?;
    let updated = repo.update(&code, &details).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Update,
            AuditModule::Supplier,
            code.as_str(),
        )
        .change(audit::snapshot(&before.details), audit::snapshot(&updated.details)),
    )
    .await;

    Ok(Json(updated))
}

#[instrument(skip(session, state))]
async fn remove(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    Path(kod): Path<String>,
) -> AppResult<Json<Message>> {
    let code = SupplierCode::parse(&kod)?;
    if !SupplierRepository::new(state.pool()).delete(&code).await? {
        return Err(AppError::NotFound(format!("supplier {code}")));
    }

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Delete,
            AuditModule::Supplier,
            code.as_str(),
        ),
    )
    .await;

    Ok(Json(Message::new("Tedarikçi silindi")))
}
