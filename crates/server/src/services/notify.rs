//! Notifications raised as a side effect of other operations.

use sqlx::PgPool;

use envanter_core::models::NewNotification;

use crate::db::NotificationRepository;

/// Store a notification.
///
/// Like audit entries, notifications follow a committed change, so a failed
/// write is logged and never fails the request.
pub async fn send(pool: &PgPool, notification: NewNotification) {
    match NotificationRepository::new(pool).create(&notification).await {
        Ok(stored) => tracing::debug!(
            id = %stored.id,
            kind = %stored.kind,
            recipient = %stored.recipient,
            "Notification stored"
        ),
        Err(e) => tracing::error!(
            error = %e,
            kind = %notification.kind,
            recipient = %notification.recipient,
            "Failed to store notification"
        ),
    }
}
