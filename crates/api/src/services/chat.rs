//! Two-party chat.
//!
//! [`ChatService`] wraps the conversation repository with participant
//! checks. [`ChatHub`] fans newly sent messages out to every open stream on
//! the same conversation. Delivery through the hub is best-effort: a client
//! that falls behind skips the missed messages and refetches history.

use std::collections::HashMap;
use std::sync::Arc;

use futures::Stream;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

use craftly_core::validation::{ValidationError, validate_message_text};
use craftly_core::{ConversationError, ConversationId, MessageId, UserId};

use crate::db::conversations::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::db::{ConversationRepository, RepositoryError, UserRepository};
use crate::models::{Conversation, Message};

/// Messages buffered per conversation before slow subscribers lag.
pub const CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Hub
// =============================================================================

/// Registry of live conversation channels.
#[derive(Clone, Default)]
pub struct ChatHub {
    channels: Arc<RwLock<HashMap<ConversationId, broadcast::Sender<Message>>>>,
}

impl ChatHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to new messages on `id`, creating its channel on first use.
    pub async fn subscribe(&self, id: &ConversationId) -> broadcast::Receiver<Message> {
        let mut channels = self.channels.write().await;
        channels
            .entry(id.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Deliver `message` to current subscribers of its conversation.
    ///
    /// Returns how many subscribers received it. A channel nobody listens to
    /// any more is dropped.
    pub async fn publish(&self, message: Message) -> usize {
        let id = message.conversation_id.clone();

        let sent = {
            let channels = self.channels.read().await;
            let Some(sender) = channels.get(&id) else {
                return 0;
            };
            sender.send(message)
        };

        match sent {
            Ok(receivers) => receivers,
            Err(_) => {
                let mut channels = self.channels.write().await;
                if channels.get(&id).is_some_and(|s| s.receiver_count() == 0) {
                    channels.remove(&id);
                    debug!(conversation_id = %id, "Pruned idle chat channel");
                }
                0
            }
        }
    }

    /// Number of conversations with a live channel.
    #[cfg(test)]
    async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

/// Turn a hub subscription into a stream of messages.
///
/// Lagged receivers skip ahead; the stream ends when the channel closes.
pub fn message_stream(mut rx: broadcast::Receiver<Message>) -> impl Stream<Item = Message> {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(message) => yield message,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Chat subscriber lagged, skipping messages");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Errors from chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Self-conversation or malformed conversation ID.
    #[error(transparent)]
    Conversation(#[from] ConversationError),

    /// Message text out of bounds.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The other participant doesn't exist.
    #[error("user not found")]
    UserNotFound,

    /// Caller is not a participant, or the conversation doesn't exist.
    #[error("not a participant in this conversation")]
    NotParticipant,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Chat operations on behalf of one user.
pub struct ChatService<'a> {
    conversations: ConversationRepository<'a>,
    users: UserRepository<'a>,
    hub: &'a ChatHub,
}

impl<'a> ChatService<'a> {
    /// Create a new chat service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, hub: &'a ChatHub) -> Self {
        Self {
            conversations: ConversationRepository::new(pool),
            users: UserRepository::new(pool),
            hub,
        }
    }

    /// Get or create the conversation between `me` and `other`.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Conversation` when `me == other`.
    /// Returns `ChatError::UserNotFound` if `other` doesn't exist.
    pub async fn start(&self, me: UserId, other: UserId) -> Result<Conversation, ChatError> {
        let id = ConversationId::between(me, other)?;

        if !self.users.exists(other).await? {
            return Err(ChatError::UserNotFound);
        }

        self.conversations
            .get_or_create(&id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ChatError::UserNotFound,
                other => ChatError::Repository(other),
            })?;

        self.conversations
            .get_for(me, &id)
            .await?
            .ok_or(ChatError::NotParticipant)
    }

    /// `me`'s conversations, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Repository` if the query fails.
    pub async fn list(&self, me: UserId) -> Result<Vec<Conversation>, ChatError> {
        Ok(self.conversations.list_for(me).await?)
    }

    /// Check that `me` takes part in `id` and that it exists.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::NotParticipant` otherwise.
    pub async fn authorize(&self, me: UserId, id: &ConversationId) -> Result<Conversation, ChatError> {
        if !id.includes(me) {
            return Err(ChatError::NotParticipant);
        }
        self.conversations
            .get_for(me, id)
            .await?
            .ok_or(ChatError::NotParticipant)
    }

    /// A page of history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::NotParticipant` if `me` isn't in the conversation.
    pub async fn messages(
        &self,
        me: UserId,
        id: &ConversationId,
        before: Option<MessageId>,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ChatError> {
        self.authorize(me, id).await?;
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Ok(self.conversations.messages(id, before, limit).await?)
    }

    /// Send a message and push it to live subscribers.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Validation` for blank or oversized text.
    /// Returns `ChatError::NotParticipant` if `me` isn't in the conversation.
    pub async fn send(&self, me: UserId, id: &ConversationId, text: &str) -> Result<Message, ChatError> {
        validate_message_text(text)?;
        self.authorize(me, id).await?;

        let recipient = id.other_participant(me).ok_or(ChatError::NotParticipant)?;
        let message = self
            .conversations
            .send(id, me, recipient, text.trim())
            .await?;

        let delivered = self.hub.publish(message.clone()).await;
        debug!(conversation_id = %id, delivered, "Chat message published");

        Ok(message)
    }

    /// Mark the conversation read for `me`.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::NotParticipant` if `me` isn't in the conversation.
    pub async fn mark_read(&self, me: UserId, id: &ConversationId) -> Result<(), ChatError> {
        self.authorize(me, id).await?;
        Ok(self.conversations.mark_read(id, me).await?)
    }

    /// Unread messages across all of `me`'s conversations.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Repository` if the query fails.
    pub async fn unread_total(&self, me: UserId) -> Result<i64, ChatError> {
        Ok(self.conversations.unread_total(me).await?)
    }

    /// Open a live subscription after checking participation.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::NotParticipant` if `me` isn't in the conversation.
    pub async fn subscribe(
        &self,
        me: UserId,
        id: &ConversationId,
    ) -> Result<broadcast::Receiver<Message>, ChatError> {
        self.authorize(me, id).await?;
        Ok(self.hub.subscribe(id).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use futures::StreamExt;

    use super::*;

    fn conversation() -> ConversationId {
        ConversationId::between(UserId::new(1), UserId::new(2)).unwrap()
    }

    fn message(id: i32) -> Message {
        Message {
            id: MessageId::new(id),
            conversation_id: conversation(),
            sender_id: UserId::new(1),
            text: format!("message {id}"),
            read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let hub = ChatHub::new();
        assert_eq!(hub.publish(message(1)).await, 0);
        assert_eq!(hub.channel_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_messages() {
        let hub = ChatHub::new();
        let mut a = hub.subscribe(&conversation()).await;
        let mut b = hub.subscribe(&conversation()).await;

        assert_eq!(hub.publish(message(7)).await, 2);
        assert_eq!(a.recv().await.unwrap().id, MessageId::new(7));
        assert_eq!(b.recv().await.unwrap().id, MessageId::new(7));
    }

    #[tokio::test]
    async fn test_other_conversations_are_isolated() {
        let hub = ChatHub::new();
        let other = ConversationId::between(UserId::new(3), UserId::new(4)).unwrap();
        let mut rx = hub.subscribe(&other).await;

        hub.publish(message(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_channel_pruned_after_last_subscriber_leaves() {
        let hub = ChatHub::new();
        let rx = hub.subscribe(&conversation()).await;
        assert_eq!(hub.channel_count().await, 1);

        drop(rx);
        assert_eq!(hub.publish(message(1)).await, 0);
        assert_eq!(hub.channel_count().await, 0);
    }

    #[tokio::test]
    async fn test_lagging_stream_skips_ahead() {
        let hub = ChatHub::new();
        let rx = hub.subscribe(&conversation()).await;

        let total = i32::try_from(CHANNEL_CAPACITY).unwrap() + 5;
        for id in 1..=total {
            hub.publish(message(id)).await;
        }

        let mut stream = Box::pin(message_stream(rx));
        let first = stream.next().await.unwrap();
        assert_eq!(first.id, MessageId::new(6));
    }
}
