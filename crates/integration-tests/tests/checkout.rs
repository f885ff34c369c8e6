//! Cart, checkout and the seller's view of the resulting order.

#![allow(clippy::unwrap_used)]

use craftly_core::{NotificationKind, OrderStatus};
use craftly_integration_tests::{list_product, sign_up, sign_up_seller, test_address};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_checkout_reserves_stock_and_notifies_seller() {
    let seller = sign_up_seller("potter").await.unwrap();
    let buyer = sign_up("buyer").await.unwrap();
    let product = list_product(&seller, "Integration bowl", 3200, 3).await.unwrap();

    let cart = buyer.app.cart.add(product.id, 2).await.unwrap();
    assert_eq!(cart.item_count, 2);

    let order = buyer.app.orders.checkout(&test_address()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.subtotal.amount.to_string(), "64.00");

    assert!(buyer.app.cart.get().await.unwrap().is_empty());
    let detail = buyer.app.products.get(product.id).await.unwrap();
    assert_eq!(detail.product.stock, 1);

    let sales = seller.app.orders.sales().await.unwrap();
    assert!(sales.iter().any(|o| o.id == order.id));

    let notifications = seller.app.notifications.list().await.unwrap();
    assert!(notifications.iter().any(|n| n.kind == NotificationKind::Order));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_adding_more_than_stock_conflicts() {
    let seller = sign_up_seller("scarce").await.unwrap();
    let buyer = sign_up("greedy").await.unwrap();
    let product = list_product(&seller, "Last vase", 4500, 1).await.unwrap();

    let err = buyer.app.cart.add(product.id, 2).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cancel_restores_stock() {
    let seller = sign_up_seller("restock").await.unwrap();
    let buyer = sign_up("changed-mind").await.unwrap();
    let product = list_product(&seller, "Linen napkins", 1800, 5).await.unwrap();

    buyer.app.cart.add(product.id, 2).await.unwrap();
    let order = buyer.app.orders.checkout(&test_address()).await.unwrap();

    let cancelled = buyer.app.orders.cancel(order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let detail = buyer.app.products.get(product.id).await.unwrap();
    assert_eq!(detail.product.stock, 5);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_empty_cart_checkout_fails() {
    let buyer = sign_up("empty").await.unwrap();
    let err = buyer.app.orders.checkout(&test_address()).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_concurrent_adds_accumulate() {
    let seller = sign_up_seller("busy").await.unwrap();
    let buyer = sign_up("double-click").await.unwrap();
    let product = list_product(&seller, "Stoneware mug", 2400, 10).await.unwrap();

    let (first, second) = tokio::join!(
        buyer.app.cart.add(product.id, 2),
        buyer.app.cart.add(product.id, 3)
    );
    first.unwrap();
    second.unwrap();

    let cart = buyer.app.cart.get().await.unwrap();
    assert_eq!(cart.item_count, 5);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_concurrent_adds_never_exceed_stock() {
    let seller = sign_up_seller("limited").await.unwrap();
    let buyer = sign_up("racer").await.unwrap();
    let product = list_product(&seller, "Carved spoon", 1500, 4).await.unwrap();

    let (first, second) = tokio::join!(
        buyer.app.cart.add(product.id, 3),
        buyer.app.cart.add(product.id, 3)
    );
    assert_eq!(
        [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
        1
    );

    let cart = buyer.app.cart.get().await.unwrap();
    assert_eq!(cart.item_count, 3);
}
