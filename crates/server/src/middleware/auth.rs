//! Bearer token extractors.
//!
//! Every `/api` route except login takes one of these extractors. They look
//! the token up in the session store and reject with 401 when it is missing
//! or expired, or 403 when the signed-in role is not enough.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use envanter_core::UserRole;

use crate::error::{AppError, set_sentry_user};
use crate::state::{AppState, SessionUser};

/// Extract the bearer token from the `Authorization` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn session_user(parts: &Parts, state: &AppState) -> Result<SessionUser, AppError> {
    let token = bearer_token(&parts.headers)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
    let session = state
        .sessions()
        .get(token)
        .await
        .ok_or_else(|| AppError::Unauthorized("Session expired or invalid".to_string()))?;
    set_sentry_user(&session.user.username);
    Ok(session)
}

/// Any signed-in user, including viewers.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(session): RequireUser) -> impl IntoResponse {
///     format!("Merhaba, {}!", session.user.full_name)
/// }
/// ```
pub struct RequireUser(pub SessionUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_user(parts, state).await.map(Self)
    }
}

/// A signed-in user allowed to change data (everyone but viewers).
pub struct RequireWriter(pub SessionUser);

impl FromRequestParts<AppState> for RequireWriter {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_user(parts, state).await?;
        require(session, UserRole::can_write, "Viewers have read-only access").map(Self)
    }
}

/// A signed-in Admin.
pub struct RequireAdmin(pub SessionUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_user(parts, state).await?;
        require(session, UserRole::can_manage_users, "Only admins can manage users").map(Self)
    }
}

fn require(
    session: SessionUser,
    allowed: fn(UserRole) -> bool,
    message: &str,
) -> Result<SessionUser, AppError> {
    if allowed(session.user.role) {
        Ok(session)
    } else {
        Err(AppError::Forbidden(message.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn headers_with(header: Option<&str>) -> HeaderMap {
        let mut builder = Request::builder().uri("/api/materials");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0.headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers_with(Some("Bearer abc123"))), Some("abc123"));
        assert_eq!(bearer_token(&headers_with(Some("bearer  abc123 "))), Some("abc123"));
        assert_eq!(bearer_token(&headers_with(Some("Basic abc123"))), None);
        assert_eq!(bearer_token(&headers_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&headers_with(None)), None);
    }

    #[test]
    fn test_require_role() {
        let session = SessionUser {
            id: envanter_core::UserId::new(3),
            user: envanter_core::models::User {
                username: "izleyici".to_string(),
                full_name: String::new(),
                email: String::new(),
                department: String::new(),
                role: UserRole::Viewer,
                active: true,
                last_login: None,
            },
        };
        let err = require(session.clone(), UserRole::can_write, "read-only").unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(session.actor(), "izleyici");
    }
}
