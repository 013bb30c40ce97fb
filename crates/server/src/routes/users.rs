//! User management (Admin only).

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::instrument;

use envanter_core::models::{NewAuditEntry, NewUser, User, UserUpdate};
use envanter_core::{AuditAction, AuditModule};

use crate::db::UserRepository;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::RequireAdmin;
use crate::services::audit;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/{username}", put(update))
}

#[instrument(skip_all)]
async fn list(_admin: RequireAdmin, State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(UserRepository::new(state.pool()).list().await?))
}

#[instrument(skip_all, fields(username = %new_user.username))]
async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    AppJson(new_user): AppJson<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool(), state.sessions())
        .create_user(&new_user)
        .await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &admin.user.username,
            AuditAction::Create,
            AuditModule::User,
            &user.username,
        )
        .change("", user.role.label()),
    )
    .await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Changes take effect on the user's next sign-in; open sessions are closed.
#[instrument(skip(admin, state, update))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(username): Path<String>,
    AppJson(update): AppJson<UserUpdate>,
) -> AppResult<Json<User>> {
    let before = UserRepository::new(state.pool())
        .get_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {username}")))?;
    let user = AuthService::new(state.pool(), state.sessions())
        .update_user(&username, &update)
        .await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(
            &admin.user.username,
            AuditAction::Update,
            AuditModule::User,
            &user.username,
        )
        .change(
            format!("{} / aktif={}", before.user.role.label(), before.user.active),
            format!("{} / aktif={}", user.role.label(), user.active),
        ),
    )
    .await;

    Ok(Json(user))
}
