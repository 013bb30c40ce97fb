//! Notification repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use envanter_core::models::{NewNotification, Notification};
use envanter_core::{NotificationId, NotificationKind};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    created_at: DateTime<Utc>,
    recipient: String,
    kind: NotificationKind,
    title: String,
    message: String,
    link: String,
    read: bool,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::new(row.id),
            created_at: row.created_at,
            recipient: row.recipient,
            kind: row.kind,
            title: row.title,
            message: row.message,
            link: row.link,
            read: row.read,
        }
    }
}

const NOTIFICATION_COLUMNS: &str = "id, created_at, recipient, kind, title, message, link, read";

/// Repository for notifications.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a notification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, notification: &NewNotification) -> Result<Notification, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r"
            INSERT INTO envanter.notification (recipient, kind, title, message, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {NOTIFICATION_COLUMNS}
            "
        ))
        .bind(notification.recipient.trim())
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.link)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Notifications addressed to any of `recipients`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for(&self, recipients: &[&str]) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r"
            SELECT {NOTIFICATION_COLUMNS}
            FROM envanter.notification
            WHERE recipient = ANY($1)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(recipients)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Unread notifications addressed to any of `recipients`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_count(&self, recipients: &[&str]) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM envanter.notification WHERE recipient = ANY($1) AND NOT read",
        )
        .bind(recipients)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Get one notification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: NotificationId) -> Result<Option<Notification>, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM envanter.notification WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Mark a notification read. Returns `false` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_read(&self, id: NotificationId) -> Result<bool, RepositoryError> {
        let updated = sqlx::query("UPDATE envanter.notification SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(updated.rows_affected() > 0)
    }
}
