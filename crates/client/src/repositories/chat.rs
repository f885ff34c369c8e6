//! Chat repository: conversations, history and the live message stream.

use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use craftly_core::validation::validate_message_text;
use craftly_core::{ConversationId, MessageId, UserId};

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{Conversation, CountResponse, Message, SendRequest, StartRequest};
use crate::repositories::rejected;
use crate::sse::decode_events;

#[derive(Debug, Default, Serialize)]
struct HistoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    before: Option<MessageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<i64>,
}

/// Live messages of one conversation.
pub type MessageStream = BoxStream<'static, Result<Message, ClientError>>;

/// Two-party conversations.
#[derive(Clone)]
pub struct ChatRepository {
    client: ApiClient,
}

impl ChatRepository {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Open (or reopen) the conversation with another user.
    ///
    /// # Errors
    ///
    /// `Validation` when `me` and `other` are the same user; `Api` 404 for
    /// an unknown user.
    #[instrument(skip(self))]
    pub async fn start(&self, me: UserId, other: UserId) -> Result<Conversation, ClientError> {
        ConversationId::between(me, other)
            .map_err(|e| rejected(ClientError::Validation(e.to_string())))?;
        self.client
            .post(
                "/api/conversations",
                &StartRequest {
                    participant_id: other,
                },
            )
            .await
    }

    /// The caller's conversations, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Conversation>, ClientError> {
        self.client.get("/api/conversations").await
    }

    /// A page of history in chronological order: the newest `limit`
    /// messages, or those older than `before`.
    ///
    /// # Errors
    ///
    /// `Api` 403 when the caller isn't a participant.
    #[instrument(skip(self))]
    pub async fn messages(
        &self,
        id: &ConversationId,
        before: Option<MessageId>,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ClientError> {
        self.client
            .get_query(
                &format!("/api/conversations/{id}/messages"),
                &HistoryQuery { before, limit },
            )
            .await
    }

    /// Send a message.
    ///
    /// # Errors
    ///
    /// `Validation` for blank or over-long text.
    #[instrument(skip(self, text))]
    pub async fn send(&self, id: &ConversationId, text: &str) -> Result<Message, ClientError> {
        validate_message_text(text).map_err(rejected)?;
        self.client
            .post(
                &format!("/api/conversations/{id}/messages"),
                &SendRequest { text },
            )
            .await
    }

    /// Mark the other participant's messages read.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: &ConversationId) -> Result<(), ClientError> {
        self.client
            .send::<()>(Method::POST, &format!("/api/conversations/{id}/read"), None)
            .await
    }

    /// Unread messages across every conversation.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn unread_total(&self) -> Result<i64, ClientError> {
        let total: CountResponse = self.client.get("/api/conversations/unread-total").await?;
        Ok(total.count)
    }

    /// Subscribe to new messages in a conversation.
    ///
    /// Only messages sent after the stream opens are delivered; load history
    /// with [`messages`](Self::messages) first. The stream ends when the
    /// server closes it.
    ///
    /// # Errors
    ///
    /// `Api` 403 when the caller isn't a participant.
    #[instrument(skip(self))]
    pub async fn subscribe(
        &self,
        id: &ConversationId,
    ) -> Result<MessageStream, ClientError> {
        let response = self
            .client
            .open_stream(&format!("/api/conversations/{id}/stream"))
            .await?;
        tracing::debug!(conversation_id = %id, "Chat stream opened");
        Ok(decode_events(response).boxed())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::convert::Infallible;

    use axum::{
        Json, Router,
        response::sse::{Event, Sse},
        routing::get,
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::serve;

    fn message_json(id: i32, text: &str) -> Value {
        json!({
            "id": id,
            "conversation_id": "2_5",
            "sender_id": 5,
            "text": text,
            "read": false,
            "created_at": "2026-06-01T09:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_start_rejects_self() {
        let chat = ChatRepository::new(serve(Router::new()).await);
        let err = chat.start(UserId::new(2), UserId::new(2)).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let chat = ChatRepository::new(serve(Router::new()).await);
        let id = ConversationId::between(UserId::new(2), UserId::new(5)).unwrap();
        let err = chat.send(&id, "   ").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_subscribe_yields_streamed_messages() {
        let app = Router::new().route(
            "/api/conversations/{id}/stream",
            get(|| async {
                let events = futures::stream::iter(vec![
                    Ok::<_, Infallible>(Event::default().comment("")),
                    Ok(Event::default()
                        .event("message")
                        .id("1")
                        .data(message_json(1, "hello").to_string())),
                    Ok(Event::default()
                        .event("message")
                        .id("2")
                        .data(message_json(2, "is the bowl still available?").to_string())),
                ]);
                Sse::new(events)
            }),
        );
        let chat = ChatRepository::new(serve(app).await);
        let id = ConversationId::between(UserId::new(2), UserId::new(5)).unwrap();

        let stream = chat.subscribe(&id).await.unwrap();
        let messages: Vec<Message> = stream.map(Result::unwrap).collect().await;

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[1].id, MessageId::new(2));
    }

    #[tokio::test]
    async fn test_history_query_params() {
        let app = Router::new().route(
            "/api/conversations/{id}/messages",
            get(|axum::extract::RawQuery(query): axum::extract::RawQuery| async move {
                assert_eq!(query.as_deref(), Some("before=40&limit=20"));
                Json(json!([message_json(39, "older")]))
            }),
        );
        let chat = ChatRepository::new(serve(app).await);
        let id = ConversationId::between(UserId::new(2), UserId::new(5)).unwrap();

        let page = chat
            .messages(&id, Some(MessageId::new(40)), Some(20))
            .await
            .unwrap();
        assert_eq!(page[0].text, "older");
    }
}
