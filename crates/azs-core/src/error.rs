//! Error types for Azure Stack operations.
//!
//! This module provides the error hierarchy shared by every crate in the workspace,
//! including the endpoint discovery failure kinds and structured error responses.

use serde::Serialize;
use thiserror::Error;

/// Main error type for Azure Stack operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Remote service is unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Endpoint discovery failed
    #[error("Endpoint discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Failed to parse a management API response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout waiting for service: {0}")]
    Timeout(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with details
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Token acquisition or authorization failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Conflict error
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Failure kinds of the metadata endpoint discovery call.
///
/// Discovery is all-or-nothing: any of these means no endpoint set was produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The metadata endpoint answered with a status other than 200
    #[error("metadata endpoint returned HTTP {0}")]
    Status(u16),

    /// The request never produced a response
    #[error("metadata request failed: {0}")]
    Transport(String),

    /// The response body was malformed or lacked a required field
    #[error("malformed metadata response: {0}")]
    Parse(String),

    /// The seed URL cannot be used to derive DNS suffixes
    #[error("invalid seed URL `{0}`")]
    InvalidSeedUrl(String),
}

/// Specialized result type for Azure Stack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
    /// Optional request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail structure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorDetail {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Discovery(_) => "DISCOVERY_FAILED",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            Self::Conflict(_) => "CONFLICT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Converts the error into an `ErrorResponse`.
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        self.into_error_response_with_id(None)
    }

    /// Converts the error into an `ErrorResponse` with a request ID.
    #[must_use]
    pub fn into_error_response_with_id(self, request_id: Option<String>) -> ErrorResponse {
        let details = match &self {
            Self::Discovery(DiscoveryError::Status(status)) => {
                Some(serde_json::json!({ "status": status }))
            }
            _ => None,
        };

        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details,
            },
            request_id,
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::InternalError(_)
                | Self::ConfigError(_)
                | Self::Discovery(_)
                | Self::AuthenticationFailed(_)
        )
    }

    /// Returns true if the remote service reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
