//! Storage locations.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use tracing::instrument;

use envanter_core::models::{Location, Message, NewAuditEntry, NewLocation};
use envanter_core::{AuditAction, AuditModule, LocationCode, Validate};

use crate::db::LocationRepository;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::{RequireUser, RequireWriter};
use crate::services::audit;
use crate::state::AppState;

/// Build the locations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list).post(create))
        .route("/locations/{kod}", delete(remove))
}

#[instrument(skip_all)]
async fn list(_user: RequireUser, State(state): State<AppState>) -> AppResult<Json<Vec<Location>>> {
    Ok(Json(LocationRepository::new(state.pool()).list().await?))
}

#[instrument(skip_all, fields(kod = %location.code))]
async fn create(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    AppJson(location): AppJson<NewLocation>,
) -> AppResult<(StatusCode, Json<Location>)> {
    location.validate()?;
    let created = LocationRepository::new(state.pool()).create(&location).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Create,
            AuditModule::Location,
            location.code.as_str(),
        )
        .change("", audit::snapshot(&location)),
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(session, state))]
async fn remove(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    Path(kod): Path<String>,
) -> AppResult<Json<Message>> {
    let code = LocationCode::parse(&kod)?;
    if !LocationRepository::new(state.pool()).delete(&code).await? {
        return Err(AppError::NotFound(format!("location {code}")));
    }

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Delete,
            AuditModule::Location,
            code.as_str(),
        ),
    )
    .await;

    Ok(Json(Message::new("Lokasyon silindi")))
}
