//! Repositories wrapping the REST API.
//!
//! One repository per API area. Each call is a single request; a few
//! repositories keep the last list they fetched in a [`TtlSlot`] and answer
//! from it while it is fresh. Mutations through the same repository
//! invalidate its slot.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use craftly_core::TtlSlot;

use crate::error::ClientError;

pub mod auth;
pub mod cart;
pub mod chat;
pub mod favorites;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod profile;
pub mod reviews;

pub use auth::AuthRepository;
pub use cart::CartRepository;
pub use chat::ChatRepository;
pub use favorites::FavoritesRepository;
pub use notifications::NotificationRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use profile::ProfileRepository;
pub use reviews::ReviewRepository;

/// A single cached value shared by concurrent callers.
pub(crate) struct CachedSlot<T> {
    name: &'static str,
    slot: Mutex<TtlSlot<T>>,
}

impl<T: Clone> CachedSlot<T> {
    pub(crate) fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            slot: Mutex::new(TtlSlot::new(ttl)),
        }
    }

    /// Return the cached value, or fetch, store and return a fresh one.
    ///
    /// The lock isn't held across the fetch; two callers racing on an empty
    /// slot both fetch and the later `put` wins.
    pub(crate) async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        {
            let slot = self.slot.lock().await;
            if let Some(value) = slot.get(Instant::now()) {
                tracing::debug!(cache = self.name, "Cache hit");
                return Ok(value.clone());
            }
        }

        tracing::debug!(cache = self.name, "Cache miss");
        let value = fetch().await?;
        self.slot.lock().await.put(value.clone(), Instant::now());
        Ok(value)
    }

    pub(crate) async fn invalidate(&self) {
        self.slot.lock().await.invalidate();
    }
}

/// Turn a local validation failure into a `ClientError`, logging it.
pub(crate) fn rejected<E>(err: E) -> ClientError
where
    E: Display + Into<ClientError>,
{
    tracing::warn!(error = %err, "Input rejected before sending");
    err.into()
}
