//! Product catalog cache.
//!
//! Listings, product details and the category list are cached with `moka`
//! for the configured TTL (5 minutes by default). Any product mutation
//! clears the whole cache; listings are too varied to invalidate by key.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use craftly_core::{ProductFilter, ProductId, ProductSort, ProductSummary};

use crate::db::{ProductRepository, RepositoryError};
use crate::models::ProductDetail;

/// Most entries kept at once.
const MAX_ENTRIES: u64 = 1000;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CatalogKey {
    Listing(ProductFilter, ProductSort),
    Product(ProductId),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CatalogValue {
    Listing(Arc<Vec<ProductSummary>>),
    Product(Arc<ProductDetail>),
    Categories(Arc<Vec<String>>),
}

/// Read-through cache over [`ProductRepository`].
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CatalogKey, CatalogValue>,
}

impl CatalogCache {
    /// Create an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Products matching `filter` in `sort` order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the listing isn't cached and the query fails.
    pub async fn list(
        &self,
        pool: &PgPool,
        filter: &ProductFilter,
        sort: ProductSort,
    ) -> Result<Arc<Vec<ProductSummary>>, RepositoryError> {
        let key = CatalogKey::Listing(normalize(filter), sort);

        if let Some(CatalogValue::Listing(products)) = self.cache.get(&key).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let products = Arc::new(ProductRepository::new(pool).list(filter, sort).await?);
        self.cache
            .insert(key, CatalogValue::Listing(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// A product with its seller name, or `None` if it doesn't exist.
    ///
    /// Misses are not cached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the product isn't cached and the query fails.
    pub async fn product(
        &self,
        pool: &PgPool,
        id: ProductId,
    ) -> Result<Option<Arc<ProductDetail>>, RepositoryError> {
        let key = CatalogKey::Product(id);

        if let Some(CatalogValue::Product(product)) = self.cache.get(&key).await {
            debug!(product_id = %id, "Cache hit for product");
            return Ok(Some(product));
        }

        let Some(product) = ProductRepository::new(pool).get(id).await? else {
            return Ok(None);
        };
        let product = Arc::new(product);
        self.cache
            .insert(key, CatalogValue::Product(Arc::clone(&product)))
            .await;
        Ok(Some(product))
    }

    /// Distinct product categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the list isn't cached and the query fails.
    pub async fn categories(&self, pool: &PgPool) -> Result<Arc<Vec<String>>, RepositoryError> {
        if let Some(CatalogValue::Categories(categories)) =
            self.cache.get(&CatalogKey::Categories).await
        {
            return Ok(categories);
        }

        let categories = Arc::new(ProductRepository::new(pool).categories().await?);
        self.cache
            .insert(
                CatalogKey::Categories,
                CatalogValue::Categories(Arc::clone(&categories)),
            )
            .await;
        Ok(categories)
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    /// Number of live entries (approximate until pending tasks run).
    #[cfg(test)]
    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

/// Canonical form of a filter so equivalent queries share a cache entry.
fn normalize(filter: &ProductFilter) -> ProductFilter {
    ProductFilter {
        query: filter.normalized_query().map(str::to_lowercase),
        category: filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase),
        min_price: filter.min_price.map(|p| p.normalize()),
        max_price: filter.max_price.map(|p| p.normalize()),
        in_stock_only: filter.in_stock_only,
    }
}
