//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: Strict limits for authentication endpoints
//! - `api_rate_limiter`: Relaxed limits for everything else under `/api`
//!
//! Both limits come from [`ApiConfig`](crate::config::ApiConfig).

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::config::RateLimit;

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor that trusts standard proxy headers, then falls back to the
/// peer address of the TCP connection.
///
/// The peer address is only present when the server is started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        // X-Forwarded-For (first IP in the chain)
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create the rate limiter for auth endpoints (login, registration,
/// password change). Defaults to a burst of 5, then one request every 6
/// seconds, which slows brute force attempts.
#[must_use]
pub fn auth_rate_limiter(limit: RateLimit) -> RateLimiterLayer {
    governor_layer(limit)
}

/// Create the rate limiter for the rest of the API.
#[must_use]
pub fn api_rate_limiter(limit: RateLimit) -> RateLimiterLayer {
    governor_layer(limit)
}

/// # Panics
///
/// Panics if `period_secs` or `burst` is zero. `ApiConfig` rejects both.
fn governor_layer(limit: RateLimit) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(limit.period_secs)
        .burst_size(limit.burst)
        .finish()
        .expect("rate limiter config with positive period and burst is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request() -> axum::http::request::Builder {
        Request::builder().uri("/api/auth/login")
    }

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let req = request()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_real_ip_header() {
        let req = request().header("x-real-ip", "198.51.100.2").body(()).unwrap();
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.2".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = request().body(()).unwrap();
        let peer: SocketAddr = "192.0.2.9:51000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, peer.ip());
    }

    #[test]
    fn test_no_source_is_an_error() {
        let req = request().body(()).unwrap();
        assert!(ClientIpKeyExtractor.extract(&req).is_err());
    }
}
