//! Product catalog repository.
//!
//! The unfiltered listing is cached for the configured TTL; view models
//! narrow it locally. Filtered searches always hit the API, which caches
//! them on its side.

use std::time::Duration;

use reqwest::Method;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use craftly_core::{ProductFilter, ProductId, ProductSort, ProductSummary};

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{NewProduct, ProductDetail, ProductUpdate};
use crate::repositories::CachedSlot;

/// Query string of `GET /api/products`.
#[derive(Debug, Serialize)]
struct ListingQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_price: Option<Decimal>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    in_stock: bool,
    sort: ProductSort,
}

impl<'a> ListingQuery<'a> {
    fn new(filter: &'a ProductFilter, sort: ProductSort) -> Self {
        Self {
            q: filter.normalized_query(),
            category: filter.category.as_deref(),
            min_price: filter.min_price,
            max_price: filter.max_price,
            in_stock: filter.in_stock_only,
            sort,
        }
    }
}

/// Catalog reads and seller listing management.
pub struct ProductRepository {
    client: ApiClient,
    listing: CachedSlot<Vec<ProductSummary>>,
}

impl ProductRepository {
    #[must_use]
    pub fn new(client: ApiClient, ttl: Duration) -> Self {
        Self {
            client,
            listing: CachedSlot::new("products", ttl),
        }
    }

    /// Every product, newest first. Served from cache while fresh.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ProductSummary>, ClientError> {
        self.listing
            .get_or_fetch(|| async move {
                self.search(&ProductFilter::default(), ProductSort::Newest)
                    .await
            })
            .await
    }

    /// Drop the cached listing so the next [`list`](Self::list) refetches.
    pub async fn refresh(&self) {
        self.listing.invalidate().await;
    }

    /// Filtered, sorted listing straight from the API.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
    ) -> Result<Vec<ProductSummary>, ClientError> {
        self.client
            .get_query("/api/products", &ListingQuery::new(filter, sort))
            .await
    }

    /// One product with its seller's name.
    ///
    /// # Errors
    ///
    /// `Api` 404 if the product doesn't exist.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<ProductDetail, ClientError> {
        self.client.get(&format!("/api/products/{id}")).await
    }

    /// Distinct categories, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, ClientError> {
        self.client.get("/api/products/categories").await
    }

    /// List a new product. Requires the seller role.
    ///
    /// # Errors
    ///
    /// `Api` 403 without the seller role; 400 for invalid fields.
    #[instrument(skip(self, product), fields(title = %product.title))]
    pub async fn create(&self, product: &NewProduct) -> Result<ProductSummary, ClientError> {
        let created = self.client.post("/api/products", product).await?;
        self.listing.invalidate().await;
        Ok(created)
    }

    /// Update one of the caller's listings.
    ///
    /// # Errors
    ///
    /// `Api` 403 for someone else's listing; 404 if it doesn't exist.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<ProductSummary, ClientError> {
        let updated = self
            .client
            .put(&format!("/api/products/{id}"), update)
            .await?;
        self.listing.invalidate().await;
        Ok(updated)
    }

    /// Remove one of the caller's listings.
    ///
    /// # Errors
    ///
    /// `Api` 403 for someone else's listing; 404 if it doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), ClientError> {
        self.client
            .send::<()>(Method::DELETE, &format!("/api/products/{id}"), None)
            .await?;
        self.listing.invalidate().await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::serve;

    fn product_json(id: i32) -> Value {
        json!({
            "id": id,
            "seller_id": 2,
            "title": format!("Mug {id}"),
            "description": "Wheel thrown",
            "category": "ceramics",
            "price": { "amount": "18.00", "currency_code": "USD" },
            "image_url": null,
            "stock": 5,
            "rating_average": 0.0,
            "rating_count": 0,
            "created_at": "2026-02-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_listing_is_cached_until_mutation() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/api/products",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Json(json!([product_json(1), product_json(2)])) }
            })
            .post(|| async { (StatusCode::CREATED, Json(product_json(3))) }),
        );
        let products = ProductRepository::new(serve(app).await, Duration::from_secs(60));

        assert_eq!(products.list().await.unwrap().len(), 2);
        assert_eq!(products.list().await.unwrap().len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let new = NewProduct {
            title: "Mug 3".to_owned(),
            description: String::new(),
            category: "ceramics".to_owned(),
            price: Decimal::new(1800, 2),
            image_url: None,
            stock: 1,
        };
        products.create(&new).await.unwrap();

        products.list().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_search_sends_filter_as_query() {
        let app = Router::new().route(
            "/api/products",
            get(|Query(params): Query<HashMap<String, String>>| async move { Json(params) }),
        );
        let client = serve(app).await;

        let filter = ProductFilter {
            query: Some("  mug ".to_owned()),
            category: Some("ceramics".to_owned()),
            min_price: Some(Decimal::new(500, 2)),
            max_price: None,
            in_stock_only: true,
        };
        let echoed: HashMap<String, String> = client
            .get_query("/api/products", &ListingQuery::new(&filter, ProductSort::PriceAsc))
            .await
            .unwrap();

        assert_eq!(echoed["q"], "mug");
        assert_eq!(echoed["category"], "ceramics");
        assert_eq!(echoed["min_price"], "5.00");
        assert_eq!(echoed["in_stock"], "true");
        assert_eq!(echoed["sort"], "price_asc");
        assert!(!echoed.contains_key("max_price"));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let app = Router::new().route(
            "/api/products/{id}",
            get(|| async { (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found: product 9" }))) }),
        );
        let products = ProductRepository::new(serve(app).await, Duration::from_secs(60));

        let err = products.get(ProductId::new(9)).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
