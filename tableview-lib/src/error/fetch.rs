//! Fetch error types

use std::time::Duration;

/// Errors that can occur while fetching a page from the remote endpoint.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP error response from the endpoint.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// Network error during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Invalid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The response did not match the page envelope schema.
    #[error("Response schema error: {message}")]
    Schema {
        /// Description of the mismatch.
        message: String,
    },

    /// Any other failure reported by a caller-supplied fetcher.
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Creates a new HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a "not found" HTTP error.
    pub fn not_found() -> Self {
        Self::http(404, "Not Found")
    }

    /// Creates a new schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Creates a free-form error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Returns the HTTP status code if one is known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the endpoint answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Returns `true` if re-issuing the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Network(_) => true,
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        assert!(FetchError::not_found().is_not_found());
        assert_eq!(FetchError::http(500, "boom").status_code(), Some(500));
        assert!(FetchError::http(503, "busy").is_retryable());
        assert!(!FetchError::http(400, "bad").is_retryable());
        assert!(!FetchError::schema("missing results").is_retryable());
        assert_eq!(FetchError::other("x").status_code(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(FetchError::http(500, "boom").to_string(), "HTTP 500: boom");
        assert_eq!(
            FetchError::schema("missing `results`").to_string(),
            "Response schema error: missing `results`"
        );
    }
}
