/*!
 * Error types for the scriptreview crate.
 *
 * This module contains the error types for calls made to external
 * collaborators (judge and rewriter backends), configuration loading and
 * the crate as a whole, using the thiserror crate for ergonomic error
 * definitions.
 *
 * Structural problems found by the validator are never errors: they are
 * reported as data in a `ValidationResult`.
 */

use thiserror::Error;

use crate::retry::ErrorClass;

/// Errors that can occur when calling a judge or rewriter backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The backend did not answer in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Error message from the API
        message: String,
        /// Server-suggested wait, when the backend sends one. Kept for
        /// reporting only; retries always follow the `RetryPolicy` schedule.
        retry_after_secs: Option<u64>,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Classify this error for the retry policy.
    ///
    /// Rate limits, connection drops, timeouts, HTTP 429 and 5xx responses are
    /// transient. Authentication failures, unparseable responses and any
    /// other client error will fail the same way on every attempt.
    pub fn class(&self) -> ErrorClass {
        match self {
            ProviderError::RateLimitExceeded { .. }
            | ProviderError::ConnectionError(_)
            | ProviderError::Timeout(_) => ErrorClass::Retryable,
            ProviderError::ApiError { status_code, .. } => {
                if *status_code == 429 || *status_code >= 500 {
                    ErrorClass::Retryable
                } else {
                    ErrorClass::Fatal
                }
            }
            ProviderError::RequestFailed(_)
            | ProviderError::ParseError(_)
            | ProviderError::AuthenticationError(_) => ErrorClass::Fatal,
        }
    }

    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }
}

/// Errors raised while loading or checking configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field holds a value outside its allowed domain
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Dotted path of the offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for the expected shape
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Main crate error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a collaborator backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
