//! Login, logout and the current session.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
};
use tracing::instrument;

use envanter_core::models::{Credentials, Message, NewAuditEntry, Session, User};
use envanter_core::{AuditAction, AuditModule};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::{RequireUser, bearer_token};
use crate::services::audit;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[instrument(skip(state, credentials), fields(username = %credentials.username))]
async fn login(
    State(state): State<AppState>,
    AppJson(credentials): AppJson<Credentials>,
) -> AppResult<Json<Session>> {
    let session = AuthService::new(state.pool(), state.sessions())
        .login(&credentials)
        .await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Login,
            AuditModule::Auth,
            &session.user.username,
        ),
    )
    .await;

    Ok(Json(session))
}

#[instrument(skip_all, fields(username = %session.user.username))]
async fn logout(
    RequireUser(session): RequireUser,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<Message> {
    if let Some(token) = bearer_token(&headers) {
        AuthService::new(state.pool(), state.sessions())
            .logout(token)
            .await;
    }

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &session.user.username,
            AuditAction::Logout,
            AuditModule::Auth,
            &session.user.username,
        ),
    )
    .await;

    Json(Message::new("Çıkış yapıldı"))
}

async fn me(RequireUser(session): RequireUser) -> Json<User> {
    Json(session.user)
}
