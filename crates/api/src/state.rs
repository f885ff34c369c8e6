//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::{CatalogCache, ChatHub};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    catalog: CatalogCache,
    chat: ChatHub,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let catalog = CatalogCache::new(config.catalog_cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                chat: ChatHub::new(),
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the product catalog cache.
    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.inner.catalog
    }

    /// Get a reference to the live chat hub.
    #[must_use]
    pub fn chat(&self) -> &ChatHub {
        &self.inner.chat
    }
}
