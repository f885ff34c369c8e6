//! Notification repository.

use std::time::Duration;

use reqwest::Method;
use tracing::instrument;

use craftly_core::NotificationId;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{CountResponse, Notification, UpdatedResponse};
use crate::repositories::CachedSlot;

/// In-app notifications. The list is cached for the configured TTL.
pub struct NotificationRepository {
    client: ApiClient,
    cache: CachedSlot<Vec<Notification>>,
}

impl NotificationRepository {
    #[must_use]
    pub fn new(client: ApiClient, ttl: Duration) -> Self {
        Self {
            client,
            cache: CachedSlot::new("notifications", ttl),
        }
    }

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Notification>, ClientError> {
        self.cache
            .get_or_fetch(|| self.client.get("/api/notifications"))
            .await
    }

    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn unread_count(&self) -> Result<i64, ClientError> {
        let count: CountResponse = self.client.get("/api/notifications/unread-count").await?;
        Ok(count.count)
    }

    /// # Errors
    ///
    /// `Api` 404 for an unknown notification.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: NotificationId) -> Result<(), ClientError> {
        self.client
            .send::<()>(Method::POST, &format!("/api/notifications/{id}/read"), None)
            .await?;
        self.cache.invalidate().await;
        Ok(())
    }

    /// Mark everything read, returning how many changed.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self) -> Result<u64, ClientError> {
        let updated: UpdatedResponse = self
            .client
            .post_empty("/api/notifications/read-all")
            .await?;
        self.cache.invalidate().await;
        Ok(updated.updated)
    }

    /// # Errors
    ///
    /// `Api` 404 for an unknown notification.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: NotificationId) -> Result<(), ClientError> {
        self.client
            .send::<()>(Method::DELETE, &format!("/api/notifications/{id}"), None)
            .await?;
        self.cache.invalidate().await;
        Ok(())
    }

    /// Forget the cached list.
    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        Json, Router,
        routing::{get, post},
    };
    use serde_json::json;

    use super::*;
    use crate::testing::serve;

    #[tokio::test]
    async fn test_mark_all_read_invalidates_cache() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new()
            .route(
                "/api/notifications",
                get(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async {
                        Json(json!([{
                            "id": 1,
                            "user_id": 3,
                            "kind": "order",
                            "title": "New order",
                            "body": "Order #4 includes your items",
                            "read": false,
                            "created_at": "2026-05-01T10:00:00Z"
                        }]))
                    }
                }),
            )
            .route(
                "/api/notifications/read-all",
                post(|| async { Json(json!({ "updated": 1 })) }),
            );
        let notifications = NotificationRepository::new(serve(app).await, Duration::from_secs(60));

        let list = notifications.list().await.unwrap();
        assert_eq!(list.len(), 1);
        notifications.list().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert_eq!(notifications.mark_all_read().await.unwrap(), 1);
        notifications.list().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
