//! Notification centre state.

use std::sync::Arc;

use craftly_core::NotificationId;

use crate::models::Notification;
use crate::repositories::NotificationRepository;
use crate::view_model::{LoadState, ViewModel, error_message};

/// Notification list. Read and delete actions update the loaded list in
/// place once the API confirms them.
pub struct NotificationsViewModel {
    repo: Arc<NotificationRepository>,
    state: ViewModel<Vec<Notification>>,
}

impl NotificationsViewModel {
    #[must_use]
    pub fn new(repo: Arc<NotificationRepository>) -> Self {
        Self {
            repo,
            state: ViewModel::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ViewModel<Vec<Notification>> {
        &self.state
    }

    pub async fn load(&self) -> bool {
        self.state.run(self.repo.list()).await
    }

    pub async fn mark_read(&self, id: NotificationId) -> bool {
        match self.repo.mark_read(id).await {
            Ok(()) => {
                self.state.update(|list| {
                    if let Some(n) = list.iter_mut().find(|n| n.id == id) {
                        n.read = true;
                    }
                });
                true
            }
            Err(e) => self.fail(&e),
        }
    }

    pub async fn mark_all_read(&self) -> bool {
        match self.repo.mark_all_read().await {
            Ok(_) => {
                self.state
                    .update(|list| list.iter_mut().for_each(|n| n.read = true));
                true
            }
            Err(e) => self.fail(&e),
        }
    }

    pub async fn delete(&self, id: NotificationId) -> bool {
        match self.repo.delete(id).await {
            Ok(()) => {
                self.state.update(|list| list.retain(|n| n.id != id));
                true
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Unread notifications in the loaded list.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.state
            .value()
            .map_or(0, |list| list.iter().filter(|n| !n.read).count())
    }

    fn fail(&self, err: &crate::error::ClientError) -> bool {
        tracing::warn!(error = %err, "Notification action failed");
        self.state.set(LoadState::Error(error_message(err)));
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::{
        Json, Router,
        http::StatusCode,
        routing::{delete, get, post},
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::serve;

    fn notification(id: i32, read: bool) -> Value {
        json!({
            "id": id,
            "user_id": 3,
            "kind": "message",
            "title": "New message",
            "body": "Mira: is the bowl still available?",
            "read": read,
            "created_at": "2026-05-02T10:00:00Z"
        })
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/api/notifications",
                get(|| async { Json(json!([notification(1, false), notification(2, false), notification(3, true)])) }),
            )
            .route("/api/notifications/{id}/read", post(|| async { StatusCode::NO_CONTENT }))
            .route("/api/notifications/{id}", delete(|| async { StatusCode::NO_CONTENT }))
            .route(
                "/api/notifications/read-all",
                post(|| async { Json(json!({ "updated": 2 })) }),
            )
    }

    #[tokio::test]
    async fn test_local_updates_follow_api() {
        let repo = NotificationRepository::new(serve(app()).await, Duration::from_secs(60));
        let vm = NotificationsViewModel::new(Arc::new(repo));

        assert!(vm.load().await);
        assert_eq!(vm.unread_count(), 2);

        assert!(vm.mark_read(NotificationId::new(1)).await);
        assert_eq!(vm.unread_count(), 1);

        assert!(vm.delete(NotificationId::new(3)).await);
        assert_eq!(vm.state().value().unwrap().len(), 2);

        assert!(vm.mark_all_read().await);
        assert_eq!(vm.unread_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_action_sets_error() {
        let repo = NotificationRepository::new(serve(Router::new()).await, Duration::from_secs(60));
        let vm = NotificationsViewModel::new(Arc::new(repo));

        assert!(!vm.mark_read(NotificationId::new(9)).await);
        assert!(vm.state().state().error().is_some());
    }
}
