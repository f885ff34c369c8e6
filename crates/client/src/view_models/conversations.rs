//! Inbox state: the conversation list and the total unread badge.

use tokio::sync::watch;

use craftly_core::{ConversationId, UserId};

use crate::error::ClientError;
use crate::models::{Conversation, Message};
use crate::repositories::ChatRepository;
use crate::view_model::ViewModel;

/// The caller's conversations, most recently active first.
pub struct ConversationsViewModel {
    repo: ChatRepository,
    state: ViewModel<Vec<Conversation>>,
    unread: watch::Sender<i64>,
}

impl ConversationsViewModel {
    #[must_use]
    pub fn new(repo: ChatRepository) -> Self {
        let (unread, _) = watch::channel(0);
        Self {
            repo,
            state: ViewModel::new(),
            unread,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ViewModel<Vec<Conversation>> {
        &self.state
    }

    /// Watch the total unread count.
    #[must_use]
    pub fn unread(&self) -> watch::Receiver<i64> {
        self.unread.subscribe()
    }

    /// Load the list. The unread badge is recomputed from it.
    pub async fn load(&self) -> bool {
        let ok = self.state.run(self.repo.list()).await;
        if let Some(list) = self.state.value() {
            let total = list.iter().map(|c| i64::from(c.unread_count)).sum();
            self.unread.send_replace(total);
        }
        ok
    }

    /// Open the conversation with `other` and put it at the top of the list.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the conversation can't be opened.
    pub async fn start(&self, me: UserId, other: UserId) -> Result<Conversation, ClientError> {
        let conversation = self.repo.start(me, other).await?;
        let opened = conversation.clone();
        self.state.update(|list| {
            list.retain(|c| c.id != opened.id);
            list.insert(0, opened);
        });
        Ok(conversation)
    }

    /// Mark a conversation read and clear its unread count locally.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    pub async fn mark_read(&self, id: &ConversationId) -> Result<(), ClientError> {
        self.repo.mark_read(id).await?;
        let mut cleared = 0;
        self.state.update(|list| {
            if let Some(c) = list.iter_mut().find(|c| &c.id == id) {
                cleared = i64::from(c.unread_count);
                c.unread_count = 0;
            }
        });
        self.unread
            .send_modify(|total| *total = (*total - cleared).max(0));
        Ok(())
    }

    /// Fold a message that arrived on a stream into the list.
    ///
    /// Moves its conversation to the top and, when `me` didn't send it,
    /// bumps the unread counts.
    pub fn apply_incoming(&self, me: UserId, message: &Message) {
        let mut found = false;
        let incoming = message.sender_id != me;
        self.state.update(|list| {
            if let Some(pos) = list.iter().position(|c| c.id == message.conversation_id) {
                let mut conversation = list.remove(pos);
                conversation.last_message = Some(message.text.clone());
                conversation.last_sender_id = Some(message.sender_id);
                conversation.last_message_at = Some(message.created_at);
                if incoming {
                    conversation.unread_count += 1;
                }
                list.insert(0, conversation);
                found = true;
            }
        });
        if found && incoming {
            self.unread.send_modify(|total| *total += 1);
        }
    }

    /// Refresh the unread badge from the API.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    pub async fn refresh_unread(&self) -> Result<i64, ClientError> {
        let total = self.repo.unread_total().await?;
        self.unread.send_replace(total);
        Ok(total)
    }
}
