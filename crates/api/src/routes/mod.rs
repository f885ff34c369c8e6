//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (database)
//!
//! # Auth
//! POST /api/auth/register                   - Create account, log in
//! POST /api/auth/login                      - Log in
//! POST /api/auth/logout                     - Log out
//! GET  /api/auth/me                         - Current user
//! POST /api/auth/password                   - Change password
//! POST /api/auth/become-seller              - Grant seller role
//!
//! # Products
//! GET  /api/products                        - Filtered, sorted listing
//! POST /api/products                        - Create (seller)
//! GET  /api/products/categories             - Distinct categories
//! GET  /api/products/{id}                   - Detail
//! PUT  /api/products/{id}                   - Update (owner or admin)
//! DELETE /api/products/{id}                 - Delete (owner or admin)
//!
//! # Cart (auth)
//! GET  /api/cart                            - Cart
//! DELETE /api/cart                          - Clear
//! POST /api/cart/items                      - Add or increment
//! PUT  /api/cart/items/{product_id}         - Set quantity (0 removes)
//! DELETE /api/cart/items/{product_id}       - Remove line
//!
//! # Favorites (auth)
//! GET  /api/favorites                       - List
//! GET|POST|DELETE /api/favorites/{product_id}
//!
//! # Orders (auth)
//! POST /api/orders                          - Checkout
//! GET  /api/orders                          - Own orders
//! GET  /api/orders/sales                    - Seller's sales
//! GET  /api/orders/{id}                     - Own order
//! POST /api/orders/{id}/cancel              - Buyer cancel
//! PUT  /api/orders/{id}/status              - Status change (admin)
//!
//! # Profile
//! GET|PUT /api/profile                      - Own profile (auth)
//! PUT  /api/profile/address                 - Default address (auth)
//! GET  /api/profile/{user_id}               - Public profile
//!
//! # Reviews
//! GET  /api/reviews/product/{product_id}    - Product reviews
//! POST /api/reviews                         - Create (auth)
//! DELETE /api/reviews/{id}                  - Delete (author or admin)
//!
//! # Notifications (auth)
//! GET  /api/notifications                   - List
//! GET  /api/notifications/unread-count
//! POST /api/notifications/read-all
//! POST /api/notifications/{id}/read
//! DELETE /api/notifications/{id}
//!
//! # Conversations (auth)
//! GET|POST /api/conversations               - List / get-or-create
//! GET  /api/conversations/unread-total
//! GET|POST /api/conversations/{id}/messages - History / send
//! POST /api/conversations/{id}/read         - Mark read
//! GET  /api/conversations/{id}/stream       - SSE live messages
//! ```

pub mod auth;
pub mod cart;
pub mod conversations;
pub mod favorites;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod profile;
pub mod reviews;

use axum::{Router, routing::get};

use crate::config::ApiConfig;
use crate::middleware::api_rate_limiter;
use crate::state::AppState;

/// Create the `/api` routes.
pub fn api_routes(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router(config.auth_rate_limit))
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/favorites", favorites::router())
        .nest("/orders", orders::router())
        .nest("/profile", profile::router())
        .nest("/reviews", reviews::router())
        .nest("/notifications", notifications::router())
        .nest("/conversations", conversations::router())
        .layer(api_rate_limiter(config.api_rate_limit))
}

/// Create all routes for the API.
pub fn routes(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes(config))
}
