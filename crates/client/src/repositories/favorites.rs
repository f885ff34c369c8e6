//! Favourites repository.

use std::time::Duration;

use reqwest::Method;
use tracing::instrument;

use craftly_core::ProductId;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{FavoriteItem, FavoriteStatus};
use crate::repositories::CachedSlot;

/// The signed-in user's favourites, cached for the configured TTL.
pub struct FavoritesRepository {
    client: ApiClient,
    cache: CachedSlot<Vec<FavoriteItem>>,
}

impl FavoritesRepository {
    #[must_use]
    pub fn new(client: ApiClient, ttl: Duration) -> Self {
        Self {
            client,
            cache: CachedSlot::new("favorites", ttl),
        }
    }

    /// Favourites, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<FavoriteItem>, ClientError> {
        self.cache
            .get_or_fetch(|| self.client.get("/api/favorites"))
            .await
    }

    /// Whether a product is favourited.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn is_favorite(&self, product_id: ProductId) -> Result<bool, ClientError> {
        let status: FavoriteStatus = self
            .client
            .get(&format!("/api/favorites/{product_id}"))
            .await?;
        Ok(status.favorite)
    }

    /// Favourite a product. Adding one twice is harmless.
    ///
    /// # Errors
    ///
    /// `Api` 404 for an unknown product.
    #[instrument(skip(self))]
    pub async fn add(&self, product_id: ProductId) -> Result<(), ClientError> {
        self.client
            .send::<()>(Method::POST, &format!("/api/favorites/{product_id}"), None)
            .await?;
        self.cache.invalidate().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: ProductId) -> Result<(), ClientError> {
        self.client
            .send::<()>(Method::DELETE, &format!("/api/favorites/{product_id}"), None)
            .await?;
        self.cache.invalidate().await;
        Ok(())
    }

    /// Add or remove, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if either request fails.
    #[instrument(skip(self))]
    pub async fn toggle(&self, product_id: ProductId) -> Result<bool, ClientError> {
        if self.is_favorite(product_id).await? {
            self.remove(product_id).await?;
            Ok(false)
        } else {
            self.add(product_id).await?;
            Ok(true)
        }
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
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::json;

    use super::*;
    use crate::testing::serve;

    #[tokio::test]
    async fn test_toggle_flips_state_and_invalidates() {
        let favorite = Arc::new(AtomicBool::new(false));
        let lists = Arc::new(AtomicUsize::new(0));

        let (f1, f2, f3) = (Arc::clone(&favorite), Arc::clone(&favorite), Arc::clone(&favorite));
        let counter = Arc::clone(&lists);
        let app = Router::new()
            .route(
                "/api/favorites",
                get(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Json(json!([])) }
                }),
            )
            .route(
                "/api/favorites/{product_id}",
                get(move || {
                    let favorite = f1.load(Ordering::SeqCst);
                    async move { Json(json!({ "favorite": favorite })) }
                })
                .post(move || {
                    f2.store(true, Ordering::SeqCst);
                    async { StatusCode::CREATED }
                })
                .delete(move || {
                    f3.store(false, Ordering::SeqCst);
                    async { StatusCode::NO_CONTENT }
                }),
            );
        let favorites = FavoritesRepository::new(serve(app).await, Duration::from_secs(60));

        favorites.list().await.unwrap();
        favorites.list().await.unwrap();
        assert_eq!(lists.load(Ordering::SeqCst), 1);

        assert!(favorites.toggle(ProductId::new(5)).await.unwrap());
        assert!(favorite.load(Ordering::SeqCst));
        favorites.list().await.unwrap();
        assert_eq!(lists.load(Ordering::SeqCst), 2);

        assert!(!favorites.toggle(ProductId::new(5)).await.unwrap());
        assert!(!favorite.load(Ordering::SeqCst));
    }
}
