//! Centralized error types for the Ver Praia application.
//!
//! Library crates raise their own typed errors; anything that reaches the
//! presentation layer is converted into [`AppError`] so there is one place
//! that decides what a user gets to read.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }

    /// Classify a startup failure, recovering the typed error under any
    /// added context.
    pub fn from_startup(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ConfigError>() {
            Ok(config) => return AppError::Config(config),
            Err(err) => err,
        };
        match err.downcast::<std::io::Error>() {
            Ok(io) => AppError::Io(io),
            Err(err) => AppError::Other(err),
        }
    }
}

/// Failures talking to the balneability API.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// No response arrived (unreachable host, timeout, connection reset).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The server answered with a non-success status.
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// The body could not be decoded into the expected records.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to reach the monitoring service. Check your internet connection."
            }
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The monitoring service is having issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response from the monitoring service."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}
