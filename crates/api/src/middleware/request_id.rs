//! Request correlation IDs.
//!
//! Every request carries an ID in `x-request-id`. A well-formed ID from the
//! caller (the web client or a proxy) is kept; anything else is replaced by
//! a fresh UUID v4 so arbitrary header bytes never reach the logs. The ID
//! fills the `request_id` field of the `http_request` span, tags the Sentry
//! scope and is echoed on the response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// The caller's ID if it is 1 to 128 characters of ASCII letters, digits,
/// `-`, `_` or `.`.
fn incoming_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?;
    let valid = !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    valid.then(|| raw.to_owned())
}

/// Attach a correlation ID to the request's span and its response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = incoming_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());

    // Declared empty by the TraceLayer span in `app`
    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn echoed(header: Option<&str>) -> String {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_id_middleware));

        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(REQUEST_ID_HEADER, value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_owned()
    }

    #[tokio::test]
    async fn test_well_formed_caller_id_is_kept() {
        assert_eq!(echoed(Some("web-7f3a.2")).await, "web-7f3a.2");
    }

    #[tokio::test]
    async fn test_malformed_id_is_replaced() {
        let id = echoed(Some("abc def\tinjected")).await;
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn test_generated_when_missing() {
        assert!(Uuid::parse_str(&echoed(None).await).is_ok());
    }

    #[test]
    fn test_overlong_id_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&"a".repeat(129)).unwrap());
        assert!(incoming_id(&headers).is_none());

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&"a".repeat(128)).unwrap());
        assert!(incoming_id(&headers).is_some());
    }
}
