//! Craftly Client - typed SDK for the marketplace API.
//!
//! Layers, bottom up:
//!
//! - [`ApiClient`] - one `reqwest` client with a cookie store, JSON helpers
//!   and error mapping
//! - [`repositories`] - one repository per API area; products, favourites,
//!   orders and notifications keep a short-lived single-entry cache
//! - [`view_model`] / [`view_models`] - observable `Idle | Loading | Success
//!   | Error` state for screens
//!
//! Input the API would reject (malformed email, weak password, rating out of
//! range, short review) is rejected locally and never sent.
//!
//! # Example
//!
//! ```rust,ignore
//! let craftly = Craftly::new(&ClientConfig::from_env()?)?;
//! craftly.auth.login("ada@craftly.test", "secret123").await?;
//! let cart = craftly.cart.add(ProductId::new(4), 1).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
mod sse;
pub mod view_model;
pub mod view_models;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use view_model::{LoadState, ViewModel};

use repositories::{
    AuthRepository, CartRepository, ChatRepository, FavoritesRepository, NotificationRepository,
    OrderRepository, ProductRepository, ProfileRepository, ReviewRepository,
};

/// Every repository, sharing one [`ApiClient`] and so one session.
#[derive(Clone)]
pub struct Craftly {
    pub auth: AuthRepository,
    pub products: Arc<ProductRepository>,
    pub cart: CartRepository,
    pub favorites: Arc<FavoritesRepository>,
    pub orders: Arc<OrderRepository>,
    pub profile: ProfileRepository,
    pub reviews: ReviewRepository,
    pub notifications: Arc<NotificationRepository>,
    pub chat: ChatRepository,
}

impl Craftly {
    /// Build the client and every repository from `config`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client can't be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = ApiClient::new(config)?;
        let ttl = config.cache_ttl;

        Ok(Self {
            auth: AuthRepository::new(client.clone()),
            products: Arc::new(ProductRepository::new(client.clone(), ttl)),
            cart: CartRepository::new(client.clone()),
            favorites: Arc::new(FavoritesRepository::new(client.clone(), ttl)),
            orders: Arc::new(OrderRepository::new(client.clone(), ttl)),
            profile: ProfileRepository::new(client.clone()),
            reviews: ReviewRepository::new(client.clone()),
            notifications: Arc::new(NotificationRepository::new(client.clone(), ttl)),
            chat: ChatRepository::new(client),
        })
    }

    /// Sign out and forget every per-user cache.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the logout request fails. Caches are cleared
    /// either way.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let result = self.auth.logout().await;
        self.favorites.invalidate().await;
        self.orders.invalidate().await;
        self.notifications.invalidate().await;
        result
    }
}
