//! Tabular exports as `{headers, data, filename}`.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use tracing::instrument;

use envanter_core::export::{ExportKind, ExportTable};
use envanter_core::models::{MovementFilter, OrderFilter, RequestFilter};

use crate::db::{MaterialRepository, MovementRepository, OrderRepository, RequestRepository};
use crate::error::{AppError, AppResult};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Build the export router.
pub fn router() -> Router<AppState> {
    Router::new().route("/export/{kind}", get(export))
}

#[instrument(skip(_user, state))]
async fn export(
    _user: RequireUser,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> AppResult<Json<ExportTable>> {
    let kind: ExportKind = kind.parse().map_err(AppError::NotFound)?;
    let pool = state.pool();

    let table = match kind {
        ExportKind::Materials => {
            ExportTable::materials(&MaterialRepository::new(pool).list_all().await?)
        }
        ExportKind::Movements => ExportTable::movements(
            &MovementRepository::new(pool)
                .list(&MovementFilter::default())
                .await?,
        ),
        ExportKind::Requests => ExportTable::requests(
            &RequestRepository::new(pool)
                .list(&RequestFilter::default())
                .await?,
        ),
        ExportKind::Orders => {
            ExportTable::orders(&OrderRepository::new(pool).list(&OrderFilter::default()).await?)
        }
    };

    Ok(Json(table))
}
