//! Cart screen state.

use craftly_core::ProductId;

use crate::models::Cart;
use crate::repositories::CartRepository;
use crate::view_model::ViewModel;

/// The cart screen. Every action republishes the whole cart the API returns.
pub struct CartViewModel {
    repo: CartRepository,
    state: ViewModel<Cart>,
}

impl CartViewModel {
    #[must_use]
    pub fn new(repo: CartRepository) -> Self {
        Self {
            repo,
            state: ViewModel::new(),
        }
    }

    /// The observable state.
    #[must_use]
    pub const fn state(&self) -> &ViewModel<Cart> {
        &self.state
    }

    pub async fn load(&self) -> bool {
        self.state.run(self.repo.get()).await
    }

    pub async fn add(&self, product_id: ProductId, quantity: u32) -> bool {
        self.state.run(self.repo.add(product_id, quantity)).await
    }

    /// Change a line's quantity; zero removes it.
    pub async fn set_quantity(&self, product_id: ProductId, quantity: u32) -> bool {
        self.state
            .run(self.repo.set_quantity(product_id, quantity))
            .await
    }

    pub async fn remove(&self, product_id: ProductId) -> bool {
        self.state.run(self.repo.remove(product_id)).await
    }

    /// Empty the cart, then reload it.
    pub async fn clear(&self) -> bool {
        self.state
            .run(async {
                self.repo.clear().await?;
                self.repo.get().await
            })
            .await
    }

    /// Units in the loaded cart, zero before it loads.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.state.value().map_or(0, |cart| cart.item_count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Json, Router,
        http::StatusCode,
        routing::{get, post},
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::serve;
    use crate::view_model::LoadState;

    fn cart_json(quantity: u32) -> Value {
        json!({
            "lines": [{
                "product_id": 4,
                "title": "Linen tea towel",
                "image_url": null,
                "unit_price": { "amount": "12.50", "currency_code": "USD" },
                "quantity": quantity,
                "stock": 8,
                "added_at": "2026-04-01T08:00:00Z"
            }],
            "subtotal": { "amount": "25.00", "currency_code": "USD" },
            "item_count": quantity
        })
    }

    #[tokio::test]
    async fn test_load_then_add() {
        let app = Router::new()
            .route("/api/cart", get(|| async { Json(cart_json(1)) }))
            .route("/api/cart/items", post(|| async { Json(cart_json(2)) }));
        let vm = CartViewModel::new(CartRepository::new(serve(app).await));

        assert_eq!(vm.item_count(), 0);
        assert!(vm.load().await);
        assert_eq!(vm.item_count(), 1);

        assert!(vm.add(ProductId::new(4), 1).await);
        let cart = vm.state().value().unwrap();
        assert_eq!(cart.line(ProductId::new(4)).unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_out_of_stock_becomes_error_state() {
        let app = Router::new().route(
            "/api/cart/items",
            post(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({ "error": "only 8 of Linen tea towel in stock" })),
                )
            }),
        );
        let vm = CartViewModel::new(CartRepository::new(serve(app).await));

        assert!(!vm.add(ProductId::new(4), 9).await);
        assert_eq!(
            vm.state().state(),
            LoadState::Error("only 8 of Linen tea towel in stock".to_string())
        );
    }
}
