//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`
//! and every error body has the shape `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use craftly_core::ConversationError;
use craftly_core::validation::ValidationError;

use crate::db::{OrderError, RepositoryError};
use crate::services::auth::AuthError;
use crate::services::chat::ChatError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout or order status change failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Chat operation failed.
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Input failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const INTERNAL_MESSAGE: &str = "Internal server error";

fn repository_parts(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
        }
    }
}

impl AppError {
    /// Status code and client-facing message.
    ///
    /// Internal error details never reach the client.
    fn parts(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => repository_parts(err),
            Self::Internal(_) | Self::Session(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string())
                }
                AuthError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid email address".to_string())
                }
                AuthError::WrongPassword | AuthError::WeakPassword(_) | AuthError::Validation(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                AuthError::UserNotFound => (StatusCode::NOT_FOUND, err.to_string()),
                AuthError::UserAlreadyExists => (StatusCode::CONFLICT, err.to_string()),
                AuthError::Repository(inner) => repository_parts(inner),
                AuthError::PasswordHash => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
            Self::Order(err) => match err {
                OrderError::EmptyCart | OrderError::MixedCurrency => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                OrderError::OutOfStock(_) | OrderError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                OrderError::Repository(inner) => repository_parts(inner),
            },
            Self::Chat(err) => match err {
                ChatError::Conversation(
                    ConversationError::SameParticipant | ConversationError::Malformed(_),
                )
                | ChatError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                ChatError::UserNotFound => (StatusCode::NOT_FOUND, err.to_string()),
                ChatError::NotParticipant => (StatusCode::FORBIDDEN, err.to_string()),
                ChatError::Repository(inner) => repository_parts(inner),
            },
            Self::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use craftly_core::OrderStatus;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let body = err.into_response().into_body();
        let bytes = to_bytes(body, 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_by_kind() {
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("dup".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::DataCorruption("bad".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_errors_map_to_client_statuses() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(get_status(OrderError::EmptyCart.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(
                OrderError::InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Cancelled,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ChatError::NotParticipant.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(ChatError::Conversation(ConversationError::SameParticipant).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let body = body_json(AppError::Conflict("already reviewed".to_string())).await;
        assert_eq!(body, json!({ "error": "already reviewed" }));
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body = body_json(AppError::Internal("connection refused at 10.0.0.3".to_string())).await;
        assert_eq!(body, json!({ "error": "Internal server error" }));

        let body = body_json(RepositoryError::DataCorruption("bad email".to_string()).into()).await;
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
