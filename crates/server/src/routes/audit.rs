//! Audit log queries.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use tracing::instrument;

use envanter_core::models::{AuditEntry, AuditFilter};

use crate::db::AuditRepository;
use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Build the audit log router.
pub fn router() -> Router<AppState> {
    Router::new().route("/audit-logs", get(list))
}

#[instrument(skip(_user, state))]
async fn list(
    _user: RequireUser,
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<AuditFilter>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    Ok(Json(AuditRepository::new(state.pool()).list(&filter).await?))
}
