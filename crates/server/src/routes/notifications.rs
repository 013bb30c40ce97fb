//! In-app notifications of the signed-in user.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use tracing::instrument;

use envanter_core::models::notification::EVERYONE;
use envanter_core::models::{Message, NewNotification, Notification, UnreadCount, User};
use envanter_core::{NotificationId, Validate};

use crate::db::{NotificationRepository, UserRepository};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::middleware::{RequireUser, RequireWriter};
use crate::state::{AppState, SessionUser};

/// Build the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list).post(create))
        .route("/notifications/unread/count", get(unread_count))
        .route("/notifications/{id}/read", put(mark_read))
}

/// `?username=` reads another user's notifications (Admin only).
#[derive(Debug, Default, Deserialize)]
struct NotificationQuery {
    #[serde(default)]
    username: Option<String>,
}

/// Every recipient string that addresses `user`.
fn recipients(user: &User) -> Vec<&str> {
    let mut recipients = vec![EVERYONE, user.username.as_str(), user.role.label()];
    if user.display_name() != user.username {
        recipients.push(user.display_name());
    }
    recipients
}

/// The user whose notifications are requested.
async fn target_user(state: &AppState, session: SessionUser, query: NotificationQuery) -> AppResult<User> {
    let Some(username) = query.username.filter(|u| !u.trim().is_empty() && *u != session.user.username)
    else {
        return Ok(session.user);
    };
    if !session.user.role.can_manage_users() {
        return Err(AppError::Forbidden(
            "Only admins can read other users' notifications".to_string(),
        ));
    }
    UserRepository::new(state.pool())
        .get_by_username(&username)
        .await?
        .map(|stored| stored.user)
        .ok_or_else(|| AppError::NotFound(format!("user {username}")))
}

#[instrument(skip_all)]
async fn list(
    RequireUser(session): RequireUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let user = target_user(&state, session, query).await?;
    let notifications = NotificationRepository::new(state.pool())
        .list_for(&recipients(&user))
        .await?;
    Ok(Json(notifications))
}

#[instrument(skip_all)]
async fn unread_count(
    RequireUser(session): RequireUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<NotificationQuery>,
) -> AppResult<Json<UnreadCount>> {
    let user = target_user(&state, session, query).await?;
    let count = NotificationRepository::new(state.pool())
        .unread_count(&recipients(&user))
        .await?;
    Ok(Json(UnreadCount { count }))
}

/// Notifications addressed to someone else read as missing.
#[instrument(skip(session, state))]
async fn mark_read(
    RequireUser(session): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Message>> {
    let id = NotificationId::new(id);
    let repo = NotificationRepository::new(state.pool());
    let visible = repo
        .get(id)
        .await?
        .is_some_and(|n| n.is_for(&session.user) || session.user.role.can_manage_users());
    if !visible || !repo.mark_read(id).await? {
        return Err(AppError::NotFound("Bildirim bulunamadı".to_string()));
    }
    Ok(Json(Message::new("Bildirim okundu olarak işaretlendi")))
}

#[instrument(skip_all, fields(kullanici = %notification.recipient, tip = %notification.kind))]
async fn create(
    RequireWriter(_session): RequireWriter,
    State(state): State<AppState>,
    AppJson(notification): AppJson<NewNotification>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    notification.validate()?;
    let created = NotificationRepository::new(state.pool())
        .create(&notification)
        .await?;
    tracing::info!(id = %created.id, "Notification posted");
    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
mod tests {
    use envanter_core::UserRole;

    use super::*;

    fn user(full_name: &str) -> User {
        User {
            username: "ayse".to_string(),
            full_name: full_name.to_string(),
            email: String::new(),
            department: String::new(),
            role: UserRole::Manager,
            active: true,
            last_login: None,
        }
    }

    #[test]
    fn test_recipients_cover_every_address() {
        assert_eq!(
            recipients(&user("Ayşe Yılmaz")),
            vec!["all", "ayse", "Yönetici", "Ayşe Yılmaz"]
        );
        assert_eq!(recipients(&user("")), vec!["all", "ayse", "Yönetici"]);
    }
}
