//! Conversation and message repository.
//!
//! Conversation rows are keyed by [`ConversationId`]; each participant has a
//! `conversation_member` row holding their unread counter.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use craftly_core::{ConversationId, MessageId, NotificationKind, UserId};

use super::{RepositoryError, notifications};
use crate::models::{Conversation, Message};

/// Default page size for message history.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 200;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    id: String,
    other_user_id: i32,
    other_display_name: String,
    last_message: Option<String>,
    last_sender_id: Option<i32>,
    last_message_at: Option<DateTime<Utc>>,
    unread_count: i32,
    created_at: DateTime<Utc>,
}

fn parse_id(raw: &str) -> Result<ConversationId, RepositoryError> {
    ConversationId::parse(raw).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = RepositoryError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&row.id)?,
            other_user_id: UserId::new(row.other_user_id),
            other_display_name: row.other_display_name,
            last_message: row.last_message,
            last_sender_id: row.last_sender_id.map(UserId::new),
            last_message_at: row.last_message_at,
            unread_count: row.unread_count,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i32,
    conversation_id: String,
    sender_id: i32,
    text: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MessageId::new(row.id),
            conversation_id: parse_id(&row.conversation_id)?,
            sender_id: UserId::new(row.sender_id),
            text: row.text,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

/// Conversations as seen by `m.user_id`.
const SELECT_CONVERSATION: &str = r"
    SELECT c.id, o.user_id AS other_user_id,
           COALESCE(p.display_name, '') AS other_display_name,
           c.last_message, c.last_sender_id, c.last_message_at,
           m.unread_count, c.created_at
    FROM craftly.conversation_member m
    JOIN craftly.conversation c ON c.id = m.conversation_id
    JOIN craftly.conversation_member o
      ON o.conversation_id = c.id AND o.user_id <> m.user_id
    LEFT JOIN craftly.profile p ON p.user_id = o.user_id
    WHERE m.user_id = $1
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for chat database operations.
pub struct ConversationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ConversationRepository<'a> {
    /// Create a new conversation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create the conversation and both member rows if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if either participant doesn't exist.
    pub async fn get_or_create(&self, id: &ConversationId) -> Result<(), RepositoryError> {
        let (low, high) = id.participants();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO craftly.conversation (id, participant_low, participant_high)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(id.to_string())
        .bind(low)
        .bind(high)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::on_missing_parent)?;

        sqlx::query(
            r"
            INSERT INTO craftly.conversation_member (conversation_id, user_id)
            VALUES ($1, $2), ($1, $3)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(id.to_string())
        .bind(low)
        .bind(high)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// One conversation from `viewer`'s side, if they take part.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for(
        &self,
        viewer: UserId,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query_as::<_, ConversationRow>(&format!(
            "{SELECT_CONVERSATION} AND c.id = $2"
        ))
        .bind(viewer)
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// All of `viewer`'s conversations, most recently active first.
    ///
    /// Conversations with no messages yet sort last.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for(&self, viewer: UserId) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query_as::<_, ConversationRow>(&format!(
            "{SELECT_CONVERSATION} ORDER BY c.last_message_at DESC NULLS LAST, c.created_at DESC"
        ))
        .bind(viewer)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// A page of messages in ascending time order.
    ///
    /// Returns the newest `limit` messages older than `before` (or the newest
    /// overall when `before` is `None`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn messages(
        &self,
        id: &ConversationId,
        before: Option<MessageId>,
        limit: i64,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r"
            SELECT * FROM (
                SELECT id, conversation_id, sender_id, text, read, created_at
                FROM craftly.message
                WHERE conversation_id = $1
                  AND ($2::INTEGER IS NULL OR id < $2)
                ORDER BY created_at DESC, id DESC
                LIMIT $3
            ) page
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(id.to_string())
        .bind(before)
        .bind(limit.clamp(1, MAX_PAGE_SIZE))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Store a message from `sender` to `recipient`.
    ///
    /// Updates the conversation's last-message fields, increments the
    /// recipient's unread counter in place and leaves them a notification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the conversation doesn't exist.
    pub async fn send(
        &self,
        id: &ConversationId,
        sender: UserId,
        recipient: UserId,
        text: &str,
    ) -> Result<Message, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let key = id.to_string();

        let row = sqlx::query_as::<_, MessageRow>(
            r"
            INSERT INTO craftly.message (conversation_id, sender_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, conversation_id, sender_id, text, read, created_at
            ",
        )
        .bind(&key)
        .bind(sender)
        .bind(text)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::on_missing_parent)?;

        sqlx::query(
            r"
            UPDATE craftly.conversation
            SET last_message = $2, last_sender_id = $3, last_message_at = $4
            WHERE id = $1
            ",
        )
        .bind(&key)
        .bind(text)
        .bind(sender)
        .bind(row.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE craftly.conversation_member
            SET unread_count = unread_count + 1
            WHERE conversation_id = $1 AND user_id = $2
            ",
        )
        .bind(&key)
        .bind(recipient)
        .execute(&mut *tx)
        .await?;

        let sender_name = sqlx::query_scalar::<_, String>(
            "SELECT display_name FROM craftly.profile WHERE user_id = $1",
        )
        .bind(sender)
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or_default();

        notifications::insert(
            &mut *tx,
            recipient,
            NotificationKind::Message,
            &format!("New message from {sender_name}"),
            &preview(text),
        )
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Zero `reader`'s unread counter and mark the other side's messages read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_read(&self, id: &ConversationId, reader: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let key = id.to_string();

        sqlx::query(
            r"
            UPDATE craftly.conversation_member SET unread_count = 0
            WHERE conversation_id = $1 AND user_id = $2
            ",
        )
        .bind(&key)
        .bind(reader)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE craftly.message SET read = TRUE
            WHERE conversation_id = $1 AND sender_id <> $2 AND NOT read
            ",
        )
        .bind(&key)
        .bind(reader)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Sum of `user`'s unread counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_total(&self, user: UserId) -> Result<i64, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COALESCE(SUM(unread_count), 0)::BIGINT
            FROM craftly.conversation_member
            WHERE user_id = $1
            ",
        )
        .bind(user)
        .fetch_one(self.pool)
        .await?;
        Ok(total)
    }
}

/// First line of a message, cut to 80 characters for notification bodies.
fn preview(text: &str) -> String {
    const MAX: usize = 80;
    let line = text.trim().lines().next().unwrap_or_default();
    if line.chars().count() <= MAX {
        line.to_owned()
    } else {
        let cut: String = line.chars().take(MAX - 1).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("  hello\nsecond line"), "hello");
        let long = "x".repeat(100);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 80);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn test_row_with_bad_id_is_corruption() {
        let row = MessageRow {
            id: 1,
            conversation_id: "2_1".to_owned(),
            sender_id: 1,
            text: "hi".to_owned(),
            read: false,
            created_at: Utc::now(),
        };
        assert!(matches!(
            Message::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
