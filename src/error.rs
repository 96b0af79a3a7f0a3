//! Error types for the HTTP wrapper and the API access layer.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures raised by [`crate::http::HttpClient`].
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("server responded with {status}")]
    Status { status: StatusCode, body: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("refusing to send request to foreign origin: {0}")]
    ForeignOrigin(String),
}

impl HttpError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// What page controllers and commands see when an operation fails.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No local session where one is required.
    #[error("not logged in")]
    Unauthenticated,

    /// Any server or network failure, already turned into a readable message.
    #[error("{0}")]
    RequestFailed(String),

    /// A required field was missing; no request was sent.
    #[error("{0}")]
    ValidationFailed(String),

    #[error("could not persist session: {0}")]
    SessionStorage(#[from] std::io::Error),
}

impl ApiError {
    /// Normalizes a wrapper failure into [`ApiError::RequestFailed`].
    ///
    /// `fallback` is used when the server sent no usable `{message}` body.
    pub fn from_http(err: HttpError, fallback: &str) -> ApiError {
        match err {
            HttpError::Status { body, .. } => {
                ApiError::RequestFailed(message_from_body(&body).unwrap_or_else(|| fallback.to_string()))
            }
            other => {
                tracing::warn!("{}: {}", fallback, other);
                ApiError::RequestFailed(fallback.to_string())
            }
        }
    }

    pub fn validation(message: impl Into<String>) -> ApiError {
        ApiError::ValidationFailed(message.into())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    details: Option<Details>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Details {
    One(String),
    Many(Vec<String>),
}

/// Extracts `"<message>: <details>"` from a `{message, details?}` error body.
pub fn message_from_body(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = parsed.message.filter(|m| !m.trim().is_empty())?;
    let details = match parsed.details {
        Some(Details::One(d)) => d,
        Some(Details::Many(list)) => list.join(", "),
        None => String::new(),
    };
    if details.trim().is_empty() {
        Some(message)
    } else {
        Some(format!("{}: {}", message, details))
    }
}
