//! HTTP client for the Craftly API.
//!
//! One `reqwest::Client` with a cookie store is built per [`ApiClient`] and
//! shared by every clone, so the session cookie set at login travels with
//! all later requests.

use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, api_error};

/// Shared API client.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client can't be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(concat!("craftly-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.inner.http.request(method, self.url(path)?))
    }

    /// GET and decode JSON.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failure.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.execute(self.request(Method::GET, path)?).await?;
        decode(response).await
    }

    /// GET with a query string and decode JSON.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failure.
    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .execute(self.request(Method::GET, path)?.query(query))
            .await?;
        decode(response).await
    }

    /// POST a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failure.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(Method::POST, path)?.json(body))
            .await?;
        decode(response).await
    }

    /// POST without a body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failure.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.execute(self.request(Method::POST, path)?).await?;
        decode(response).await
    }

    /// PUT a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failure.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(Method::PUT, path)?.json(body))
            .await?;
        decode(response).await
    }

    /// DELETE and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status or decode failure.
    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.execute(self.request(Method::DELETE, path)?).await?;
        decode(response).await
    }

    /// Send a request whose response body is ignored (204s, 201s without body).
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport or status failure.
    pub async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.request(method, path)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request).await?;
        Ok(())
    }

    /// Open a Server-Sent Events response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport or status failure.
    pub async fn open_stream(&self, path: &str) -> Result<Response, ClientError> {
        let request = self
            .request(Method::GET, path)?
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"));
        self.execute(request).await
    }

    /// Send a request and turn non-success statuses into `ClientError::Api`.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = match self.inner.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%method, %path, error = %e, "API request failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = api_error(status, &body);
        tracing::warn!(%method, %path, status = status.as_u16(), error = %err, "API request rejected");
        Err(err)
    }
}

/// Decode a JSON response body.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        tracing::warn!(error = %e, "Failed to decode API response");
        ClientError::Decode(e.to_string())
    })
}
