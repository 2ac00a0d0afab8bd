//! Error types for API operations

use crate::date::DateError;

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while talking to the WaniKani API
///
/// None of these are retried internally; a failed page fails the whole fetch.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response
    #[error("Transport error: {0}")]
    Transport(String),

    /// 4xx with the server's structured error body
    #[error("API error {code} ({status}) for {url}: {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        code: i64,
        message: Option<String>,
        url: String,
    },

    /// Any other unexpected status
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// The body didn't match the expected shape
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        /// Raw body, kept for diagnostics
        body: Vec<u8>,
        #[source]
        source: serde_json::Error,
    },

    /// Request body couldn't be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// A timestamp no strategy recognized
    #[error(transparent)]
    Date(#[from] DateError),

    /// Bad base URL or next-page link
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status, when the error came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } | ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the request for exceeding the rate limit
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Whether the API token was rejected
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// The raw body of an undecodable response, lossily as text
    pub fn body_text(&self) -> Option<String> {
        match self {
            ApiError::Decode { body, .. } => Some(String::from_utf8_lossy(body).into_owned()),
            _ => None,
        }
    }
}

#[cfg(feature = "reqwest-transport")]
impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Transport(format!("timed out: {e}"))
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}
