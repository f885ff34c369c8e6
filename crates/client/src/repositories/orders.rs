//! Order repository: checkout, history and seller sales.

use std::time::Duration;

use tracing::instrument;

use craftly_core::{OrderId, OrderStatus, ShippingAddress};

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{CheckoutRequest, Order, StatusRequest};
use crate::repositories::{CachedSlot, rejected};

/// The signed-in user's orders. Order history is cached for the configured
/// TTL; every order-changing call invalidates it.
pub struct OrderRepository {
    client: ApiClient,
    history: CachedSlot<Vec<Order>>,
}

impl OrderRepository {
    #[must_use]
    pub fn new(client: ApiClient, ttl: Duration) -> Self {
        Self {
            client,
            history: CachedSlot::new("orders", ttl),
        }
    }

    /// Check out the current cart.
    ///
    /// The address is validated locally first.
    ///
    /// # Errors
    ///
    /// `Validation` for an incomplete address; `Api` 400 for an empty cart,
    /// 409 when an item is out of stock.
    #[instrument(skip(self, address))]
    pub async fn checkout(&self, address: &ShippingAddress) -> Result<Order, ClientError> {
        address.validate().map_err(rejected)?;
        let order: Order = self
            .client
            .post(
                "/api/orders",
                &CheckoutRequest {
                    shipping_address: address,
                },
            )
            .await?;
        self.history.invalidate().await;
        tracing::info!(order_id = %order.id, "Order placed");
        Ok(order)
    }

    /// Own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Order>, ClientError> {
        self.history
            .get_or_fetch(|| self.client.get("/api/orders"))
            .await
    }

    /// # Errors
    ///
    /// `Api` 404 for unknown orders and other users' orders.
    #[instrument(skip(self))]
    pub async fn get(&self, id: OrderId) -> Result<Order, ClientError> {
        self.client.get(&format!("/api/orders/{id}")).await
    }

    /// Cancel a pending or processing order.
    ///
    /// # Errors
    ///
    /// `Api` 409 once the order has shipped.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<Order, ClientError> {
        let order = self
            .client
            .post_empty(&format!("/api/orders/{id}/cancel"))
            .await?;
        self.history.invalidate().await;
        Ok(order)
    }

    /// Move an order to its next status. Admin only.
    ///
    /// # Errors
    ///
    /// `Api` 403 without the admin role; 409 for a disallowed transition.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ClientError> {
        let order = self
            .client
            .put(&format!("/api/orders/{id}/status"), &StatusRequest { status })
            .await?;
        self.history.invalidate().await;
        Ok(order)
    }

    /// Orders containing the caller's products. Seller only; not cached.
    ///
    /// # Errors
    ///
    /// `Api` 403 without the seller role.
    #[instrument(skip(self))]
    pub async fn sales(&self) -> Result<Vec<Order>, ClientError> {
        self.client.get("/api/orders/sales").await
    }

    /// Forget the cached history.
    pub async fn invalidate(&self) {
        self.history.invalidate().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;

    use super::*;
    use crate::testing::serve;

    #[tokio::test]
    async fn test_incomplete_address_rejected_locally() {
        let orders = OrderRepository::new(serve(Router::new()).await, Duration::from_secs(60));
        let address = ShippingAddress {
            full_name: String::new(),
            line1: "1 Loom St".to_owned(),
            line2: None,
            city: "Portland".to_owned(),
            region: None,
            postal_code: "97201".to_owned(),
            country: "US".to_owned(),
            phone: None,
        };

        let err = orders.checkout(&address).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
