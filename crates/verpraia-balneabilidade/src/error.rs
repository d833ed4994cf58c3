//! Error types for the balneability data-access layer.

use serde_json::Value;
use thiserror::Error;
use verpraia_core::{AppError, ConfigError, NetworkError};

/// Message used when the upstream did not supply one.
pub const DEFAULT_ERROR_MESSAGE: &str = "Request failed";

/// Normalized failure of a single request.
///
/// Transport failures (unreachable host, timeout) have no `status` and no
/// `data`. Non-2xx responses carry the status code, the upstream `message`
/// field when present, and the decoded response body.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RequestError {
    pub status: Option<u16>,
    pub message: String,
    pub data: Option<Value>,
}

impl RequestError {
    /// A failure where no response was received.
    pub fn transport() -> Self {
        Self {
            status: None,
            message: DEFAULT_ERROR_MESSAGE.to_string(),
            data: None,
        }
    }

    /// A non-success response with an optional body.
    pub fn from_response(status: u16, data: Option<Value>) -> Self {
        let message = data
            .as_ref()
            .and_then(|body| body.get("message"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_ERROR_MESSAGE)
            .to_string();

        Self {
            status: Some(status),
            message,
            data,
        }
    }
}

/// Errors surfaced by the repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The body arrived but was not the expected JSON document.
    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RepoError {
    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(e) => e.status,
            Self::Decode(_) => None,
        }
    }

    /// Text suitable for an inline error label.
    pub fn message(&self) -> String {
        match self {
            Self::Request(e) => e.message.clone(),
            Self::Decode(e) => e.to_string(),
        }
    }
}

/// Errors building an [`HttpClient`](crate::http::HttpClient).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid Origin header value: {0:?}")]
    InvalidOrigin(String),

    #[error("Failed to create HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        let network = match err {
            RepoError::Request(RequestError {
                status: Some(status),
                message,
                ..
            }) => NetworkError::ServerError { status, message },
            RepoError::Request(e) => NetworkError::ConnectionFailed(e.message),
            RepoError::Decode(e) => NetworkError::InvalidResponse(e.to_string()),
        };
        AppError::Network(network)
    }
}

/// A base URL or origin that does not parse came from configuration.
impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidBaseUrl { .. } | ClientError::InvalidOrigin(_) => {
                AppError::Config(ConfigError::Invalid(err.to_string()))
            }
            ClientError::Build(_) => AppError::Other(err.into()),
        }
    }
}
