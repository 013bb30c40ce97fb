//! Material master data.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use tracing::instrument;

use envanter_core::models::{
    ImportSummary, Material, MaterialDetails, MaterialFilter, Message, NewAuditEntry, NewMaterial,
};
use envanter_core::{AuditAction, AuditModule, MaterialCode, Validate};

use crate::db::MaterialRepository;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::middleware::{RequireUser, RequireWriter};
use crate::services::audit;
use crate::services::import::{self, ImportError};
use crate::state::AppState;

/// Build the materials router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/materials", get(list).post(create))
        .route("/materials/critical", get(critical))
        .route("/materials/import-excel", post(import_file))
        .route("/materials/{kod}", get(show).put(update).delete(archive))
}

#[instrument(skip_all)]
async fn list(
    _user: RequireUser,
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<MaterialFilter>,
) -> AppResult<Json<Vec<Material>>> {
    Ok(Json(MaterialRepository::new(state.pool()).list(&filter).await?))
}

#[instrument(skip_all)]
async fn critical(_user: RequireUser, State(state): State<AppState>) -> AppResult<Json<Vec<Material>>> {
    Ok(Json(MaterialRepository::new(state.pool()).list_critical().await?))
}

#[instrument(skip(_user, state))]
async fn show(
    _user: RequireUser,
    State(state): State<AppState>,
    Path(kod): Path<String>,
) -> AppResult<Json<Material>> {
    let code = MaterialCode::parse(&kod)?;
    MaterialRepository::new(state.pool())
        .get(&code)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("material {code}")))
}

#[instrument(skip_all, fields(kod = %material.code))]
async fn create(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    AppJson(material): AppJson<NewMaterial>,
) -> AppResult<(StatusCode, Json<Material>)> {
    material.validate()?;
    let created = MaterialRepository::new(state.pool())
        .create(&material, &session.actor())
        .await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Create,
            AuditModule::Material,
            created.code.as_str(),
        )
        .change("", audit::snapshot(&created)),
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(session, state, details))]
async fn update(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    Path(kod): Path<String>,
    AppJson(details): AppJson<MaterialDetails>,
) -> AppResult<Json<Material>> {
    let code = MaterialCode::parse(&kod)?;
    details.validate()?;
    let repo = MaterialRepository::new(state.pool());

    let before = repo
        .get(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("material {code}")))?;
    let updated = repo.update(&code, &details).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Update,
            AuditModule::Material,
            code.as_str(),
        )
        .change(audit::snapshot(&before), audit::snapshot(&updated)),
    )
    .await;

    Ok(Json(updated))
}

/// Deleting a material archives it; its movements stay in the ledger.
#[instrument(skip(session, state))]
async fn archive(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    Path(kod): Path<String>,
) -> AppResult<Json<Message>> {
    let code = MaterialCode::parse(&kod)?;
    let archived = MaterialRepository::new(state.pool())
        .archive(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("material {code}")))?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Delete,
            AuditModule::Material,
            code.as_str(),
        )
        .change(audit::snapshot(&archived), ""),
    )
    .await;

    Ok(Json(Message::new("Malzeme silindi")))
}

/// Import materials from an uploaded CSV `file` field.
#[instrument(skip_all)]
async fn import_file(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportSummary>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            upload = Some((filename, bytes));
            break;
        }
    }
    let (filename, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("missing multipart field \"file\"".to_string()))?;

    let parsed = import::parse_materials_csv(&bytes).map_err(import_error)?;
    let summary = import::apply(state.pool(), parsed, &session.actor())
        .await
        .map_err(import_error)?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Create,
            AuditModule::Material,
            &filename,
        )
        .detail(format!(
            "import: {} created, {} updated, {} skipped",
            summary.imported, summary.updated, summary.skipped
        )),
    )
    .await;

    Ok(Json(summary))
}

fn import_error(err: ImportError) -> AppError {
    match err {
        ImportError::Repository(e) => e.into(),
        other => AppError::BadRequest(other.to_string()),
    }
}
