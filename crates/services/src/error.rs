//! Shared error types for the services crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use storage::repository::StorageError;
use tutor_core::model::{ExamConfigError, MaterialError, ProgressError};

/// Failure codes of the completion endpoint's error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ApiKeyInvalid,
    RateLimit,
    Overloaded,
    Unknown,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ApiKeyInvalid => "API_KEY_INVALID",
            ErrorCode::RateLimit => "RATE_LIMIT",
            ErrorCode::Overloaded => "OVERLOADED",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    /// Code for an HTTP status: 401, 429 and 529 are specific, the rest unknown.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::ApiKeyInvalid,
            429 => ErrorCode::RateLimit,
            529 => ErrorCode::Overloaded,
            _ => ErrorCode::Unknown,
        }
    }

    /// Parse a wire code; anything unrecognized is `Unknown`.
    #[must_use]
    pub fn from_wire(code: &str) -> Self {
        match code {
            "API_KEY_INVALID" => ErrorCode::ApiKeyInvalid,
            "RATE_LIMIT" => ErrorCode::RateLimit,
            "OVERLOADED" => ErrorCode::Overloaded,
            _ => ErrorCode::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors emitted by an `LlmTransport`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LlmError {
    #[error("Invalid API key. Please check your environment variables.")]
    ApiKeyInvalid,
    #[error("Rate limit exceeded. Please wait a moment.")]
    RateLimited,
    #[error("The model is currently overloaded. Please try again.")]
    Overloaded,
    #[error("{message}")]
    Unknown { message: String },
    #[error("malformed completion response: {0}")]
    Decode(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl LlmError {
    /// Build an error from a failure code and the server's message.
    #[must_use]
    pub fn from_code(code: ErrorCode, message: Option<String>) -> Self {
        match code {
            ErrorCode::ApiKeyInvalid => LlmError::ApiKeyInvalid,
            ErrorCode::RateLimit => LlmError::RateLimited,
            ErrorCode::Overloaded => LlmError::Overloaded,
            ErrorCode::Unknown => LlmError::Unknown {
                message: message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Failed to process request".to_string()),
            },
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            LlmError::ApiKeyInvalid => ErrorCode::ApiKeyInvalid,
            LlmError::RateLimited => ErrorCode::RateLimit,
            LlmError::Overloaded => ErrorCode::Overloaded,
            LlmError::Http(err) => err
                .status()
                .map_or(ErrorCode::Unknown, |s| ErrorCode::from_status(s.as_u16())),
            LlmError::Unknown { .. } | LlmError::Decode(_) => ErrorCode::Unknown,
        }
    }
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),
    #[error("invalid value for {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Errors emitted by `StudyService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyServiceError {
    #[error(transparent)]
    ExamConfig(#[from] ExamConfigError),
    #[error(transparent)]
    Material(#[from] MaterialError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
