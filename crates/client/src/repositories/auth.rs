//! Account repository: registration, sign-in and roles.

use reqwest::Method;
use tracing::instrument;

use craftly_core::Email;
use craftly_core::validation::{validate_display_name, validate_password};

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{LoginRequest, PasswordRequest, RegisterRequest, User};
use crate::repositories::rejected;

/// Sign-in and account operations. The session cookie lives in the shared
/// [`ApiClient`].
#[derive(Clone)]
pub struct AuthRepository {
    client: ApiClient,
}

impl AuthRepository {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Create an account and sign in as it.
    ///
    /// The email, password and display name are checked locally first.
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` for bad input; `Api` 409 if the email is taken.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, ClientError> {
        let email = Email::parse(email).map_err(rejected)?;
        validate_password(password).map_err(rejected)?;
        validate_display_name(display_name).map_err(rejected)?;

        let user: User = self
            .client
            .post(
                "/api/auth/register",
                &RegisterRequest {
                    email: email.as_str(),
                    password,
                    display_name: display_name.trim(),
                },
            )
            .await?;
        tracing::info!(user_id = %user.id, "Registered");
        Ok(user)
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` for a malformed email or empty password;
    /// `Api` 401 for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let email = Email::parse(email).map_err(rejected)?;
        if password.is_empty() {
            return Err(rejected(ClientError::Validation(
                "password is required".to_string(),
            )));
        }

        self.client
            .post(
                "/api/auth/login",
                &LoginRequest {
                    email: email.as_str(),
                    password,
                },
            )
            .await
    }

    /// Sign out.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.client
            .send::<()>(Method::POST, "/api/auth/logout", None)
            .await
    }

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// `Api` 401 when nobody is signed in.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ClientError> {
        self.client.get("/api/auth/me").await
    }

    /// The signed-in user, or `None` when anonymous.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` for anything other than a 401.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<Option<User>, ClientError> {
        match self.me().await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Change the password. The new one must pass the strength rules.
    ///
    /// # Errors
    ///
    /// `ClientError::Validation` for a weak password; `Api` 401 when the
    /// current password is wrong.
    #[instrument(skip_all)]
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ClientError> {
        validate_password(new).map_err(rejected)?;
        self.client
            .send(
                Method::POST,
                "/api/auth/password",
                Some(&PasswordRequest {
                    current_password: current,
                    new_password: new,
                }),
            )
            .await
    }

    /// Grant the seller role to the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails.
    #[instrument(skip(self))]
    pub async fn become_seller(&self) -> Result<User, ClientError> {
        self.client.post_empty("/api/auth/become-seller").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        Json, Router,
        http::StatusCode,
        routing::{get, post},
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::serve;

    fn user_json() -> Value {
        json!({
            "id": 3,
            "email": "ada@craftly.test",
            "display_name": "Ada",
            "roles": ["buyer"],
            "created_at": "2026-01-02T03:04:05Z"
        })
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_server() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/api/auth/register",
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Json(user_json()) }
            }),
        );
        let auth = AuthRepository::new(serve(app).await);

        let err = auth.register("not-an-email", "secret123", "Ada").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let err = auth.register("ada@craftly.test", "short1", "Ada").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref m) if m.contains("at least 8")));

        let err = auth.register("ada@craftly.test", "secret123", " A ").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let user = auth.register("Ada@Craftly.test", "secret123", "Ada").await.unwrap();
        assert_eq!(user.display_name, "Ada");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_current_user_is_none_when_anonymous() {
        let app = Router::new().route(
            "/api/auth/me",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "Authentication required" })),
                )
            }),
        );
        let auth = AuthRepository::new(serve(app).await);

        assert!(auth.current_user().await.unwrap().is_none());
        assert!(auth.me().await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn test_login_rejects_empty_password() {
        let app = Router::new();
        let auth = AuthRepository::new(serve(app).await);

        let err = auth.login("ada@craftly.test", "").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
