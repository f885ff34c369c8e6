//! Craftly marketplace API library.
//!
//! This crate provides the REST backend as a library, allowing the router
//! to be tested in-process and reused by the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers are added by the binary, outside of this stack.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());
    let cors = middleware::cors_layer(state.config());

    routes::routes(state.config())
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::tests::test_config;
    use crate::config::{ApiConfig, RateLimit};

    /// Router over a pool that never connects unless a handler queries it.
    fn test_app() -> Router {
        app_with(test_config())
    }

    fn app_with(config: ApiConfig) -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/craftly_test")
            .unwrap();
        app(AppState::new(config, pool))
    }

    async fn send(method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.10");
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        test_app().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = send("GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_me_requires_login() {
        let response = send("GET", "/api/auth/me", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Authentication required" })
        );
    }

    #[tokio::test]
    async fn test_protected_routes_reject_anonymous() {
        for (method, uri, body) in [
            ("GET", "/api/cart", None),
            ("POST", "/api/cart/items", Some(json!({ "product_id": 1, "quantity": 1 }))),
            ("GET", "/api/favorites", None),
            ("GET", "/api/orders", None),
            ("GET", "/api/notifications/unread-count", None),
            ("GET", "/api/conversations", None),
            ("GET", "/api/conversations/1_2/stream", None),
            ("POST", "/api/products", Some(json!({}))),
        ] {
            let response = send(method, uri, body).await;
            assert_eq!(
                response.status(),
                StatusCode::UNAUTHORIZED,
                "{method} {uri} should require login"
            );
        }
    }

    #[tokio::test]
    async fn test_responses_carry_security_headers_and_request_id() {
        let response = send("GET", "/health", None).await;
        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-123");
    }

    /// Send `count` registrations from one IP through a single router.
    ///
    /// The email is invalid, so each request that gets past the limiter is
    /// answered with 400 before any query runs.
    async fn register_statuses(app: Router, count: usize) -> Vec<StatusCode> {
        let mut statuses = Vec::with_capacity(count);
        for _ in 0..count {
            let request = Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("x-forwarded-for", "127.0.0.1")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "email": "nope", "password": "pw", "display_name": "N" }).to_string(),
                ))
                .unwrap();
            statuses.push(app.clone().oneshot(request).await.unwrap().status());
        }
        statuses
    }

    #[tokio::test]
    async fn test_default_auth_limit_rejects_after_burst() {
        let statuses = register_statuses(test_app(), 7).await;
        assert!(statuses[..5].iter().all(|s| *s == StatusCode::BAD_REQUEST));
        assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(statuses[6], StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_configured_auth_burst_allows_more_sign_ups() {
        let mut config = test_config();
        config.auth_rate_limit = RateLimit {
            period_secs: 6,
            burst: 20,
        };
        let statuses = register_statuses(app_with(config), 12).await;
        assert!(statuses.iter().all(|s| *s == StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = send("GET", "/api/nope", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_numeric_path_is_rejected() {
        let response = send("GET", "/api/reviews/product/abc", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
