//! Shopping cart repository.

use reqwest::Method;
use tracing::instrument;

use craftly_core::ProductId;
use craftly_core::validation::validate_quantity;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{AddItemRequest, Cart, QuantityRequest};
use crate::repositories::rejected;

/// The signed-in user's cart. Never cached: stock and prices move.
#[derive(Clone)]
pub struct CartRepository {
    client: ApiClient,
}

impl CartRepository {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<Cart, ClientError> {
        self.client.get("/api/cart").await
    }

    /// Add `quantity` units, on top of any already in the cart.
    ///
    /// # Errors
    ///
    /// `Validation` for a quantity outside 1..=99; `Api` 404 for an unknown
    /// product, 409 when the cart would exceed stock.
    #[instrument(skip(self))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<Cart, ClientError> {
        validate_quantity(quantity).map_err(rejected)?;
        self.client
            .post(
                "/api/cart/items",
                &AddItemRequest {
                    product_id,
                    quantity,
                },
            )
            .await
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// `Validation` above 99; `Api` 409 when above stock.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, ClientError> {
        if quantity > 0 {
            validate_quantity(quantity).map_err(rejected)?;
        }
        self.client
            .put(
                &format!("/api/cart/items/{product_id}"),
                &QuantityRequest { quantity },
            )
            .await
    }

    /// # Errors
    ///
    /// `Api` 404 if the product isn't in the cart.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: ProductId) -> Result<Cart, ClientError> {
        self.client
            .delete_json(&format!("/api/cart/items/{product_id}"))
            .await
    }

    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), ClientError> {
        self.client
            .send::<()>(Method::DELETE, "/api/cart", None)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Json, Router, routing::put};
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::serve;

    #[tokio::test]
    async fn test_quantity_validated_locally() {
        let cart = CartRepository::new(serve(Router::new()).await);

        let err = cart.add(ProductId::new(1), 0).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let err = cart.set_quantity(ProductId::new(1), 100).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_zero_quantity_is_sent_as_removal() {
        let app = Router::new().route(
            "/api/cart/items/{product_id}",
            put(|Json(body): Json<Value>| async move {
                assert_eq!(body, json!({ "quantity": 0 }));
                Json(json!({
                    "lines": [],
                    "subtotal": { "amount": "0", "currency_code": "USD" },
                    "item_count": 0
                }))
            }),
        );
        let cart = CartRepository::new(serve(app).await);

        let updated = cart.set_quantity(ProductId::new(4), 0).await.unwrap();
        assert!(updated.is_empty());
    }
}
