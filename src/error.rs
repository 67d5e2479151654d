//! Error handling for the messaging gateway
//!
//! One error type is shared by the connectors, the registry, the dispatch
//! service and the HTTP layer. The [`ErrorCode`] decides how an error is
//! surfaced (client error, readiness error, backend failure...).

use std::fmt;

use crate::types::Platform;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Generic/unknown error
    Unknown,
    /// Structural defect in a request (never retried)
    InvalidArgument,
    /// Connector not initialized or not connected
    NotReady,
    /// Network error while talking to a backend
    NetworkError,
    /// The backend answered but refused the operation
    BackendError,
    /// Missing or malformed configuration (secret, token, URL)
    Configuration,
    /// Authentication failed
    AuthenticationFailed,
    /// Resource not found (unregistered platform, unknown API key)
    NotFound,
    /// Permission denied
    PermissionDenied,
    /// Timeout occurred
    Timeout,
    /// Invalid state for operation
    InvalidState,
    /// Rate limit exceeded
    RateLimited,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::InvalidArgument => "Invalid argument",
            ErrorCode::NotReady => "Service not ready",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::BackendError => "Backend error",
            ErrorCode::Configuration => "Configuration error",
            ErrorCode::AuthenticationFailed => "Authentication failed",
            ErrorCode::NotFound => "Not found",
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::Timeout => "Timeout",
            ErrorCode::InvalidState => "Invalid state",
            ErrorCode::RateLimited => "Rate limit exceeded",
        }
    }

    /// HTTP status the server layer answers with for this category
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InvalidArgument | ErrorCode::NotReady => 400,
            ErrorCode::AuthenticationFailed => 401,
            ErrorCode::PermissionDenied => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::RateLimited => 429,
            ErrorCode::NetworkError | ErrorCode::BackendError => 502,
            ErrorCode::Timeout => 504,
            ErrorCode::Unknown | ErrorCode::Configuration | ErrorCode::InvalidState => 500,
        }
    }
}

/// Gateway error
#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    /// Platform the error relates to, if any
    pub(crate) platform: Option<Platform>,
    /// HTTP status code if this error came from an HTTP response
    pub(crate) http_status: Option<u16>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Error {
            code,
            message: message.into(),
            platform: None,
            http_status: None,
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::new(ErrorCode::InvalidArgument, msg)
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::new(ErrorCode::Configuration, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Error::new(ErrorCode::AuthenticationFailed, msg)
    }

    pub fn not_ready(platform: Platform) -> Self {
        Error::new(ErrorCode::NotReady, format!("{platform} service is not ready"))
            .with_platform(platform)
    }

    /// Attach the platform this error relates to (builder pattern)
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Add HTTP status code (builder pattern)
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Get the platform if available
    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    /// Get the HTTP status code of the upstream response, if available
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let code = if e.is_timeout() {
            ErrorCode::Timeout
        } else {
            ErrorCode::NetworkError
        };
        let mut error = Error::new(code, e.to_string());
        if let Some(status) = e.status() {
            error = error.with_http_status(status.as_u16());
        }
        error
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::new(ErrorCode::InvalidArgument, format!("Invalid JSON: {e}"))
    }
}
