//! Chat domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use craftly_core::{ConversationId, MessageId, UserId};

/// A conversation as seen by one of its participants.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub other_user_id: UserId,
    pub other_display_name: String,
    pub last_message: Option<String>,
    pub last_sender_id: Option<UserId>,
    pub last_message_at: Option<DateTime<Utc>>,
    /// Messages the viewer has not read yet.
    pub unread_count: i32,
    pub created_at: DateTime<Utc>,
}

/// A chat message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub text: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
