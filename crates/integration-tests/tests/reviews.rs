//! Reviews and favorites against a running API.

#![allow(clippy::unwrap_used)]

use craftly_client::models::NewReview;
use craftly_integration_tests::{list_product, sign_up, sign_up_seller};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_review_updates_product_rating() {
    let seller = sign_up_seller("reviewed").await.unwrap();
    let buyer = sign_up("critic").await.unwrap();
    let product = list_product(&seller, "Reviewed mug", 2400, 10).await.unwrap();

    let review = buyer
        .app
        .reviews
        .create(&NewReview {
            product_id: product.id,
            rating: 4,
            comment: "Sturdy and a lovely glaze.".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(review.rating, 4);

    let detail = buyer.app.products.get(product.id).await.unwrap();
    assert_eq!(detail.product.rating_count, 1);

    let listed = buyer.app.reviews.for_product(product.id).await.unwrap();
    assert_eq!(listed.len(), 1);

    buyer.app.reviews.delete(review.id).await.unwrap();
    assert!(buyer.app.reviews.for_product(product.id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_second_review_conflicts() {
    let seller = sign_up_seller("once").await.unwrap();
    let buyer = sign_up("repeat").await.unwrap();
    let product = list_product(&seller, "Single review plate", 3000, 2).await.unwrap();

    let review = NewReview {
        product_id: product.id,
        rating: 5,
        comment: "Great.".to_string(),
    };
    buyer.app.reviews.create(&review).await.unwrap();
    let err = buyer.app.reviews.create(&review).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_favorite_toggle() {
    let seller = sign_up_seller("faved").await.unwrap();
    let buyer = sign_up("fan").await.unwrap();
    let product = list_product(&seller, "Favorite jug", 5200, 1).await.unwrap();

    assert!(buyer.app.favorites.toggle(product.id).await.unwrap());
    let favorites = buyer.app.favorites.list().await.unwrap();
    assert!(favorites.iter().any(|f| f.product.id == product.id));

    assert!(!buyer.app.favorites.toggle(product.id).await.unwrap());
    assert!(!buyer.app.favorites.is_favorite(product.id).await.unwrap());
}
