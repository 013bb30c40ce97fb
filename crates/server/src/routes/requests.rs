//! Material requests and their review.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::instrument;

use envanter_core::models::{
    MaterialRequest, NewAuditEntry, NewMaterialRequest, NewNotification, RequestFilter, ReviewQuery,
};
use envanter_core::{AuditAction, AuditModule, RequestNo, RequestStatus, Review, Validate};

use crate::db::{MaterialRepository, RequestRepository};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::middleware::{RequireUser, RequireWriter};
use crate::services::{audit, notify};
use crate::state::{AppState, SessionUser};

use super::actor_or;

/// Build the requests router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list).post(create))
        .route("/requests/pending", get(pending))
        .route("/requests/{no}", get(show))
        .route("/requests/{no}/approve", put(approve))
        .route("/requests/{no}/reject", put(reject))
}

#[instrument(skip_all)]
async fn list(
    _user: RequireUser,
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<RequestFilter>,
) -> AppResult<Json<Vec<MaterialRequest>>> {
    Ok(Json(RequestRepository::new(state.pool()).list(&filter).await?))
}

#[instrument(skip_all)]
async fn pending(
    _user: RequireUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<MaterialRequest>>> {
    let filter = RequestFilter {
        status: Some(RequestStatus::Pending),
        department: None,
    };
    Ok(Json(RequestRepository::new(state.pool()).list(&filter).await?))
}

#[instrument(skip(_user, state))]
async fn show(
    _user: RequireUser,
    State(state): State<AppState>,
    Path(no): Path<String>,
) -> AppResult<Json<MaterialRequest>> {
    let number = RequestNo::parse(&no)?;
    RequestRepository::new(state.pool())
        .get(number)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("request {number}")))
}

#[instrument(skip_all, fields(kod = %request.material_code, miktar = %request.quantity))]
async fn create(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    AppJson(mut request): AppJson<NewMaterialRequest>,
) -> AppResult<(StatusCode, Json<MaterialRequest>)> {
    request.validate()?;
    request.requester = actor_or(&request.requester, &session);
    if request.department.trim().is_empty() {
        request.department.clone_from(&session.user.department);
    }
    if request.material_name.trim().is_empty() {
        let material = MaterialRepository::new(state.pool())
            .get(&request.material_code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("material {}", request.material_code)))?;
        request.material_name = material.name;
    }

    let created = RequestRepository::new(state.pool()).create(&request).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Create,
            AuditModule::Request,
            created.number.to_string(),
        )
        .change("", audit::snapshot(&created)),
    )
    .await;
    notify::send(state.pool(), NewNotification::request_created(&created)).await;

    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(session, state, query))]
async fn approve(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    Path(no): Path<String>,
    AppQuery(query): AppQuery<ReviewQuery>,
) -> AppResult<Json<MaterialRequest>> {
    let number = RequestNo::parse(&no)?;
    review(&state, &session, number, &query.reviewer, Review::Approve).await
}

#[instrument(skip(session, state, query))]
async fn reject(
    RequireWriter(session): RequireWriter,
    State(state): State<AppState>,
    Path(no): Path<String>,
    AppQuery(query): AppQuery<ReviewQuery>,
) -> AppResult<Json<MaterialRequest>> {
    let number = RequestNo::parse(&no)?;
    let decision = Review::Reject {
        reason: query.reason.trim().to_owned(),
    };
    review(&state, &session, number, &query.reviewer, decision).await
}

async fn review(
    state: &AppState,
    session: &SessionUser,
    number: RequestNo,
    reviewer: &str,
    decision: Review,
) -> AppResult<Json<MaterialRequest>> {
    let repo = RequestRepository::new(state.pool());
    let current = repo
        .get(number)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("request {number}")))?;

    let target = current.status.review(session.user.role, &decision)?;
    let reason = match &decision {
        Review::Reject { reason } => reason.as_str(),
        Review::Approve => "",
    };
    let reviewer = actor_or(reviewer, session);

    let reviewed = repo
        .review(number, current.status, target, &reviewer, reason)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("request {number} was reviewed concurrently")))?;

    let action = match &decision {
        Review::Approve => AuditAction::Approve,
        Review::Reject { .. } => AuditAction::Reject,
    };
    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            action,
            AuditModule::Request,
            number.to_string(),
        )
        .change(current.status.label(), reviewed.status.label())
        .detail(reason),
    )
    .await;
    if let Some(notification) = NewNotification::request_reviewed(&reviewed) {
        notify::send(state.pool(), notification).await;
    }

    Ok(Json(reviewed))
}
