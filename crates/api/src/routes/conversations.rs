//! Conversation route handlers.
//!
//! Two-party chat between any users (typically buyer and seller). History
//! is read over JSON; new messages are pushed over Server-Sent Events to
//! every open stream of the conversation.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Sse,
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use craftly_core::{ConversationId, MessageId, UserId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Conversation, Message};
use crate::services::chat::{ChatError, ChatService, message_stream};
use crate::state::AppState;

/// Build the conversations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(start))
        .route("/unread-total", get(unread_total))
        .route("/{id}/messages", get(messages).post(send))
        .route("/{id}/read", post(mark_read))
        .route("/{id}/stream", get(stream))
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Start-conversation request body.
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub participant_id: UserId,
}

/// History page query.
#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    /// Only messages older than this one.
    pub before: Option<i32>,
    /// Page size (default 50, max 200).
    pub limit: Option<i64>,
}

/// Send-message request body.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub text: String,
}

/// Unread messages across all conversations.
#[derive(Debug, Serialize)]
pub struct UnreadTotal {
    pub count: i64,
}

/// Parse the `{id}` path segment, answering 400 for anything malformed.
fn conversation_id(raw: &str) -> Result<ConversationId> {
    ConversationId::parse(raw).map_err(|e| AppError::Chat(ChatError::Conversation(e)))
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Get or create the conversation with another user.
///
/// POST /api/conversations
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn start(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<StartRequest>,
) -> Result<Json<Conversation>> {
    let conversation = ChatService::new(state.pool(), state.chat())
        .start(user.id, req.participant_id)
        .await?;
    Ok(Json(conversation))
}

/// The caller's conversations, most recently active first.
///
/// GET /api/conversations
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Conversation>>> {
    let conversations = ChatService::new(state.pool(), state.chat())
        .list(user.id)
        .await?;
    Ok(Json(conversations))
}

/// A page of history, oldest first within the page.
///
/// GET /api/conversations/{id}/messages?before=&limit=
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn messages(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<Message>>> {
    let id = conversation_id(&id)?;
    let messages = ChatService::new(state.pool(), state.chat())
        .messages(user.id, &id, query.before.map(MessageId::new), query.limit)
        .await?;
    Ok(Json(messages))
}

/// Send a message.
///
/// POST /api/conversations/{id}/messages
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
async fn send(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Json(req): Json<SendRequest>,
) -> Result<(StatusCode, Json<Message>)> {
    let id = conversation_id(&id)?;
    let message = ChatService::new(state.pool(), state.chat())
        .send(user.id, &id, &req.text)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Mark everything the other participant sent as read.
///
/// POST /api/conversations/{id}/read
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn mark_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = conversation_id(&id)?;
    ChatService::new(state.pool(), state.chat())
        .mark_read(user.id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/conversations/unread-total
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn unread_total(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UnreadTotal>> {
    let count = ChatService::new(state.pool(), state.chat())
        .unread_total(user.id)
        .await?;
    Ok(Json(UnreadTotal { count }))
}

/// Live stream of new messages in a conversation.
///
/// GET /api/conversations/{id}/stream
///
/// Each event is named `message` and carries the message as JSON. Clients
/// that lag behind skip the missed events; they refetch history on
/// reconnect.
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn stream(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let id = conversation_id(&id)?;
    let rx = ChatService::new(state.pool(), state.chat())
        .subscribe(user.id, &id)
        .await?;

    tracing::debug!(conversation_id = %id, "Chat stream opened");

    let events = message_stream(rx).map(|message| Ok(message_event(&message)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Encode a message as an SSE event.
fn message_event(message: &Message) -> Event {
    let json = serde_json::to_string(message).unwrap_or_else(|_| {
        r#"{"error":"Failed to serialize message"}"#.to_string()
    });
    Event::default()
        .event("message")
        .id(message.id.to_string())
        .data(json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_id_rejects_malformed() {
        assert!(conversation_id("3_12").is_ok());

        let err = conversation_id("12_3").unwrap_err();
        assert!(matches!(
            err,
            AppError::Chat(ChatError::Conversation(_))
        ));
    }

    #[test]
    fn test_messages_query_is_optional() {
        let query: MessagesQuery = serde_json::from_str("{}").unwrap();
        assert!(query.before.is_none());
        assert!(query.limit.is_none());
    }
}
