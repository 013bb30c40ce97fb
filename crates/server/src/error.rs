//! Unified error handling for the API.
//!
//! Every error is returned as `{"detail": "..."}` with a matching status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use envanter_core::{CodeError, DocumentNumberError, LedgerError, TransitionError, ValidationError};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The resource is not in a state that allows the operation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The status code this error is reported with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "API request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let detail = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => format!("Conflict: {msg}"),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<CodeError> for AppError {
    fn from(err: CodeError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<DocumentNumberError> for AppError {
    fn from(err: DocumentNumberError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NonPositiveQuantity(_) => Self::BadRequest(err.to_string()),
            LedgerError::InsufficientStock { .. } => Self::Conflict(err.to_string()),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotPermitted(_) => Self::Forbidden(err.to_string()),
            TransitionError::MissingReason => Self::BadRequest(err.to_string()),
            TransitionError::Invalid { .. } | TransitionError::Final { .. } => {
                Self::Conflict(err.to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                Self::Unauthorized("Invalid username or password".to_string())
            }
            AuthError::Validation(e) => e.into(),
            AuthError::Repository(e) => e.into(),
        }
    }
}

/// Set the Sentry user context for the signed-in user.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_owned()),
            ..Default::default()
        }));
    });
}

/// Result alias used by handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use envanter_core::{MovementDirection, Quantity, RequestStatus, UserRole};
    use http_body_util::BodyExt;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn detail_of(err: AppError) -> String {
        let body = err.into_response().into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["detail"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("material KRT-001".to_string());
        assert_eq!(err.to_string(), "Not found: material KRT-001");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(get_status(AppError::NotFound("x".to_string())), StatusCode::NOT_FOUND);
        assert_eq!(get_status(AppError::Conflict("x".to_string())), StatusCode::CONFLICT);
        assert_eq!(get_status(AppError::Unauthorized("x".to_string())), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::Forbidden("x".to_string())), StatusCode::FORBIDDEN);
        assert_eq!(get_status(AppError::BadRequest("x".to_string())), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_keep_their_meaning() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("taken".to_string()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::DataCorruption("bad".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_transition_errors_map_to_status() {
        let forbidden = RequestStatus::Pending
            .review(UserRole::User, &envanter_core::Review::Approve)
            .unwrap_err();
        assert_eq!(get_status(forbidden.into()), StatusCode::FORBIDDEN);

        let conflict = RequestStatus::Approved
            .review(UserRole::Admin, &envanter_core::Review::Approve)
            .unwrap_err();
        assert_eq!(get_status(conflict.into()), StatusCode::CONFLICT);

        let missing = envanter_core::Review::reject("   ").unwrap_err();
        assert_eq!(get_status(missing.into()), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_ledger_errors_map_to_status() {
        let overdraw = envanter_core::ledger::apply(
            2,
            MovementDirection::Out,
            Quantity::new(5).unwrap(),
        )
        .unwrap_err();
        assert_eq!(get_status(overdraw.into()), StatusCode::CONFLICT);

        let zero = Quantity::new(0).unwrap_err();
        assert_eq!(get_status(zero.into()), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_errors_map_to_status() {
        assert_eq!(get_status(AuthError::InvalidCredentials.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(AuthError::Repository(RepositoryError::Conflict("taken".to_string())).into()),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let detail = detail_of(AppError::Internal("connection string leaked".to_string())).await;
        assert_eq!(detail, "Internal server error");

        let detail = detail_of(AppError::Database(RepositoryError::DataCorruption(
            "bad row".to_string(),
        )))
        .await;
        assert_eq!(detail, "Internal server error");
    }

    #[tokio::test]
    async fn test_client_errors_carry_detail() {
        let detail = detail_of(AppError::Conflict("order is delivered".to_string())).await;
        assert_eq!(detail, "Conflict: order is delivered");
    }
}
