//! Notification repository.
//!
//! Other repositories create notifications inside their own transactions
//! through [`insert`].

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use craftly_core::{NotificationId, NotificationKind, UserId};

use super::RepositoryError;
use crate::models::Notification;

/// Most notifications returned by a list call.
pub const LIST_LIMIT: i64 = 100;

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i32,
    user_id: i32,
    kind: NotificationKind,
    title: String,
    body: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::new(row.id),
            user_id: UserId::new(row.user_id),
            kind: row.kind,
            title: row.title,
            body: row.body,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

/// Insert a notification using any executor (pool or open transaction).
///
/// # Errors
///
/// Returns `sqlx::Error` if the insert fails.
pub async fn insert<'e, E>(
    executor: E,
    user_id: UserId,
    kind: NotificationKind,
    title: &str,
    body: &str,
) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r"
        INSERT INTO craftly.notification (user_id, kind, title, body)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(user_id)
    .bind(kind)
    .bind(title)
    .bind(body)
    .execute(executor)
    .await?;
    Ok(())
}

/// Repository for notification database operations.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's most recent notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r"
            SELECT id, user_id, kind, title, body, read, created_at
            FROM craftly.notification
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(LIST_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM craftly.notification WHERE user_id = $1 AND NOT read",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Mark one notification read. Returns `false` if it isn't the user's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE craftly.notification SET read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every notification read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE craftly.notification SET read = TRUE WHERE user_id = $1 AND NOT read",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete a notification. Returns `false` if it isn't the user's.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM craftly.notification WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
