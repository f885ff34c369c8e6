//! Product list screen state.
//!
//! The full listing is fetched once (through the repository's cache) and
//! the user's filter and sort are applied locally, so narrowing the list
//! never touches the network.

use std::sync::Arc;

use tokio::sync::Mutex;

use craftly_core::catalog::apply;
use craftly_core::{ProductFilter, ProductSort, ProductSummary};

use crate::repositories::ProductRepository;
use crate::view_model::{LoadState, ViewModel, error_message};

#[derive(Default)]
struct Criteria {
    loaded: bool,
    all: Vec<ProductSummary>,
    filter: ProductFilter,
    sort: ProductSort,
}

/// Product list with local filter and sort.
pub struct ProductListViewModel {
    repo: Arc<ProductRepository>,
    criteria: Mutex<Criteria>,
    state: ViewModel<Vec<ProductSummary>>,
}

impl ProductListViewModel {
    #[must_use]
    pub fn new(repo: Arc<ProductRepository>) -> Self {
        Self {
            repo,
            criteria: Mutex::new(Criteria::default()),
            state: ViewModel::new(),
        }
    }

    /// The observable state: the visible, filtered and sorted products.
    #[must_use]
    pub const fn state(&self) -> &ViewModel<Vec<ProductSummary>> {
        &self.state
    }

    /// Load the listing and show it through the current filter.
    pub async fn load(&self) -> bool {
        self.state.set(LoadState::Loading);
        match self.repo.list().await {
            Ok(products) => {
                let mut criteria = self.criteria.lock().await;
                criteria.all = products;
                criteria.loaded = true;
                self.publish(&criteria);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load products");
                self.state.set(LoadState::Error(error_message(&e)));
                false
            }
        }
    }

    /// Drop the cached listing and load again.
    pub async fn refresh(&self) -> bool {
        self.repo.refresh().await;
        self.load().await
    }

    /// Replace the filter and re-apply it locally.
    pub async fn set_filter(&self, filter: ProductFilter) {
        let mut criteria = self.criteria.lock().await;
        criteria.filter = filter;
        self.publish(&criteria);
    }

    /// Replace the sort order and re-apply it locally.
    pub async fn set_sort(&self, sort: ProductSort) {
        let mut criteria = self.criteria.lock().await;
        criteria.sort = sort;
        self.publish(&criteria);
    }

    /// Products currently hidden by the filter.
    pub async fn hidden_count(&self) -> usize {
        let criteria = self.criteria.lock().await;
        let shown = self.state.value().map_or(0, |v| v.len());
        criteria.all.len().saturating_sub(shown)
    }

    fn publish(&self, criteria: &Criteria) {
        // Nothing to narrow until the first load succeeds
        if !criteria.loaded {
            return;
        }
        let visible = apply(&criteria.all, &criteria.filter, criteria.sort);
        self.state.set(LoadState::Success(visible));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::{Json, Router, routing::get};
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::serve;

    fn product(id: i32, title: &str, price: &str, stock: i32, day: u32) -> Value {
        json!({
            "id": id,
            "seller_id": 2,
            "title": title,
            "description": "Handmade",
            "category": "ceramics",
            "price": { "amount": price, "currency_code": "USD" },
            "image_url": null,
            "stock": stock,
            "rating_average": 0.0,
            "rating_count": 0,
            "created_at": format!("2026-02-{day:02}T00:00:00Z")
        })
    }

    fn titles(vm: &ProductListViewModel) -> Vec<String> {
        vm.state()
            .value()
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect()
    }

    #[tokio::test]
    async fn test_filter_and_sort_are_local() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/api/products",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    Json(json!([
                        product(1, "Bud vase", "22.00", 0, 3),
                        product(2, "Mug", "18.00", 4, 2),
                        product(3, "Serving bowl", "64.00", 1, 1),
                    ]))
                }
            }),
        );
        let repo = ProductRepository::new(serve(app).await, Duration::from_secs(60));
        let vm = ProductListViewModel::new(Arc::new(repo));

        assert!(vm.load().await);
        assert_eq!(titles(&vm), ["Bud vase", "Mug", "Serving bowl"]);

        vm.set_sort(ProductSort::PriceAsc).await;
        assert_eq!(titles(&vm), ["Mug", "Bud vase", "Serving bowl"]);

        vm.set_filter(ProductFilter {
            in_stock_only: true,
            max_price: Some(Decimal::new(5000, 2)),
            ..ProductFilter::default()
        })
        .await;
        assert_eq!(titles(&vm), ["Mug"]);
        assert_eq!(vm.hidden_count().await, 2);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_filter_before_load_keeps_idle() {
        let repo = ProductRepository::new(serve(Router::new()).await, Duration::from_secs(60));
        let vm = ProductListViewModel::new(Arc::new(repo));

        vm.set_sort(ProductSort::Rating).await;
        assert_eq!(vm.state().state(), LoadState::Idle);
    }

    #[tokio::test]
    async fn test_load_failure_is_error_state() {
        let repo = ProductRepository::new(serve(Router::new()).await, Duration::from_secs(60));
        let vm = ProductListViewModel::new(Arc::new(repo));

        assert!(!vm.load().await);
        assert!(vm.state().state().error().is_some());
    }
}
