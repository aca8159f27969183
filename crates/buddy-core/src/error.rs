//! Centralized error types for Weather Buddy.
//!
//! Every error carries a `user_message()` written for the person chatting
//! with the assistant: short, calm and free of technical detail. The
//! `Display` output keeps the full context for logs.

use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failures reported by a service crate (weather, evaluation) as text.
    #[error("Service error: {0}")]
    Service(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "I couldn't read or write a file. Please try again.",
            AppError::Service(_) => "Something went wrong. Please try again.",
            AppError::Other(_) => "Something unexpected happened. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "I can't reach the weather service. Please check the internet connection."
            }
            NetworkError::Timeout => "The weather service is slow to answer. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Please try again a little later."
            }
            NetworkError::ServerError { .. } => "The weather request didn't work. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "The weather service sent something I didn't understand. Please try again."
            }
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed(_) | NetworkError::Timeout => true,
            NetworkError::ServerError { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            NetworkError::InvalidResponse(_) => false,
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
            ConfigError::NotFound(_) => "Settings file not found. Using defaults.",
            ConfigError::Invalid(_) => "Some settings are not valid. Please check the settings file.",
            ConfigError::ParseError(_) => "The settings file could not be read. Please check it.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::Network(NetworkError::Timeout),
            AppError::Config(ConfigError::Invalid("window".into())),
            AppError::Service("boom".into()),
            AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk")),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "empty message for {err}");
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let app_err: AppError = NetworkError::Timeout.into();
        assert!(matches!(app_err, AppError::Network(NetworkError::Timeout)));
    }

    #[test]
    fn test_server_error_messages_depend_on_status() {
        let outage = NetworkError::ServerError {
            status: 503,
            message: "unavailable".into(),
        };
        let bad_request = NetworkError::ServerError {
            status: 400,
            message: "bad".into(),
        };
        assert!(outage.user_message().contains("later"));
        assert_ne!(outage.user_message(), bad_request.user_message());
    }

    #[test]
    fn test_transient_classification() {
        assert!(NetworkError::Timeout.is_transient());
        assert!(NetworkError::ConnectionFailed("reset".into()).is_transient());
        assert!(NetworkError::ServerError {
            status: 429,
            message: String::new()
        }
        .is_transient());
        assert!(!NetworkError::ServerError {
            status: 404,
            message: String::new()
        }
        .is_transient());
        assert!(!NetworkError::InvalidResponse("html".into()).is_transient());
    }
}
