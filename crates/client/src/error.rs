//! Client error type.

use serde::Deserialize;
use thiserror::Error;

use craftly_core::EmailError;
use craftly_core::validation::{PasswordError, ValidationError};

/// Errors returned by every repository call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (connection refused, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Input rejected before it was sent.
    #[error("{0}")]
    Validation(String),

    /// The response body wasn't what the API promises.
    #[error("decode error: {0}")]
    Decode(String),

    /// A request path couldn't be joined onto the base URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// HTTP status for API errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the session is missing or expired.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }

    /// Whether the resource doesn't exist (or isn't the caller's).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PasswordError> for ClientError {
    fn from(err: PasswordError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EmailError> for ClientError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Error body every API error carries.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Build an `Api` error from a status and raw body.
///
/// Falls back to the raw body, then to the status text, when the body isn't
/// the usual `{"error": ...}` shape.
pub(crate) fn api_error(status: reqwest::StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        },
        |b| b.error,
    );
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}
