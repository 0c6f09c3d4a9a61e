//! Provider error types.

use std::fmt;

use crate::imagery::ImageryError;

/// Errors that can occur while talking to the tile service.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// HTTP request failed before a response was received
    HttpError(String),
    /// Request exceeded its deadline
    Timeout { url: String },
    /// Service answered with something other than 200
    Status { status: u16, url: String },
    /// Node data held no usable imagery
    NoImagery(ImageryError),
    /// Invalid client configuration
    InvalidConfig(String),
}

impl ProviderError {
    /// Whether another attempt could succeed.
    ///
    /// Network errors, timeouts, 429 and 5xx responses are retried. Other 4xx
    /// responses and missing imagery are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::HttpError(_) | ProviderError::Timeout { .. } => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::NoImagery(_) | ProviderError::InvalidConfig(_) => false,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::Timeout { url } => write!(f, "Request timed out: {}", url),
            ProviderError::Status { status, url } => write!(f, "HTTP {} from {}", status, url),
            ProviderError::NoImagery(e) => write!(f, "{}", e),
            ProviderError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProviderError::NoImagery(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ImageryError> for ProviderError {
    fn from(e: ImageryError) -> Self {
        ProviderError::NoImagery(e)
    }
}
