//! Account lifecycle against a running API.

#![allow(clippy::unwrap_used)]

use craftly_core::Role;
use craftly_integration_tests::{
    TEST_PASSWORD, client, database, list_product, revoke_role, sign_up, sign_up_seller,
    unique_email,
};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_register_login_logout() {
    let app = client().unwrap();
    let email = unique_email("auth");

    let user = app.auth.register(&email, TEST_PASSWORD, "Auth Tester").await.unwrap();
    assert_eq!(user.roles, vec![Role::Buyer]);
    assert_eq!(app.auth.me().await.unwrap().id, user.id);

    app.auth.logout().await.unwrap();
    assert!(app.auth.current_user().await.unwrap().is_none());

    let again = app.auth.login(&email, TEST_PASSWORD).await.unwrap();
    assert_eq!(again.id, user.id);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_email_conflicts() {
    let first = sign_up("dupe").await.unwrap();
    let other = client().unwrap();

    let err = other
        .auth
        .register(first.user.email.as_str(), TEST_PASSWORD, "Second")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_wrong_password_is_unauthorized() {
    let user = sign_up("wrongpw").await.unwrap();
    let other = client().unwrap();

    let err = other
        .auth
        .login(user.user.email.as_str(), "not-the-password")
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_change_password() {
    let user = sign_up("chpw").await.unwrap();
    user.app
        .auth
        .change_password(TEST_PASSWORD, "a-brand-new-password-9")
        .await
        .unwrap();

    let other = client().unwrap();
    other
        .auth
        .login(user.user.email.as_str(), "a-brand-new-password-9")
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_become_seller_adds_role() {
    let user = sign_up("upgrade").await.unwrap();
    let upgraded = user.app.auth.become_seller().await.unwrap();
    assert!(upgraded.has_role(Role::Seller));
    assert!(upgraded.has_role(Role::Buyer));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_revoked_seller_loses_access_without_relogin() {
    let seller = sign_up_seller("revoked").await.unwrap();
    list_product(&seller, "Before revocation", 1500, 2).await.unwrap();

    let pool = database().await.unwrap();
    revoke_role(&pool, seller.user.id, Role::Seller).await.unwrap();

    // Same session, no new login
    let err = list_product(&seller, "After revocation", 1500, 2).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
}
