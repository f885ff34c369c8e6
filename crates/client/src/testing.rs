//! Test helpers: an in-process axum server the client can talk to.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::client::ApiClient;
use crate::config::ClientConfig;

/// Serve `app` on an ephemeral local port and return a client pointed at it.
pub(crate) async fn serve(app: Router) -> ApiClient {
    ApiClient::new(&serve_config(app).await).unwrap()
}

/// Like [`serve`], but returns the configuration for building repositories.
pub(crate) async fn serve_config(app: Router) -> ClientConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ClientConfig::new(&format!("http://{addr}"))
        .unwrap()
        .with_cache_ttl(Duration::from_secs(60))
}
