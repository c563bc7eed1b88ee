//! Error types for studio operations.

/// Errors that can occur while talking to the image service.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// API key missing or otherwise unusable. Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Request parameters violate an operation's contract.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// API returned a non-2xx response.
    #[error("API error: {status} - {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body, kept for diagnostics.
        body: String,
    },

    /// Transport failure (timeout, DNS, connection reset).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response did not match any known result shape.
    #[error("no recognizable result in response")]
    Normalization {
        /// The unmodified response body.
        raw: serde_json::Value,
    },

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local image decoding or encoding failed.
    #[cfg(feature = "filters")]
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl StudioError {
    /// Status code the service uses for content-moderation rejections.
    pub const CONTENT_MODERATION_STATUS: u16 = 422;

    /// Returns the HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the service rejected the request on content-policy grounds.
    pub fn is_content_moderation(&self) -> bool {
        self.status() == Some(Self::CONTENT_MODERATION_STATUS)
    }

    /// Returns true if this error is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Message suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self {
            _ if self.is_content_moderation() => {
                "Content moderation failed. Please ensure the image is appropriate.".into()
            }
            Self::Api { status, body } => format!("request failed with status {status}: {body}"),
            Self::Normalization { raw } => {
                format!("no recognizable result in response: {raw}")
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;
