//! Foreground erasure: remove the subject and reconstruct what is behind it.

use crate::error::Result;
use crate::operations::types::{ImagePayload, ImageSource};
use serde::Serialize;

/// A request to erase an image's foreground.
#[derive(Debug, Clone, Default)]
pub struct EraseForegroundRequest {
    /// Source image; must be set before submission.
    pub image: Option<ImagePayload>,
    /// Ask the service to moderate input and output.
    pub content_moderation: bool,
}

impl EraseForegroundRequest {
    /// Creates a request from uploaded bytes.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            image: Some(ImagePayload::Bytes(data)),
            content_moderation: false,
        }
    }

    /// Creates a request from a remote URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            image: Some(ImagePayload::Url(url.into())),
            content_moderation: false,
        }
    }

    /// Enables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = enabled;
        self
    }

    pub(crate) fn to_body(&self) -> Result<serde_json::Value> {
        let body = EraseBody {
            source: ImageSource::from_payload(self.image.as_ref())?,
            content_moderation: self.content_moderation,
        };
        Ok(serde_json::to_value(body)?)
    }
}

#[derive(Debug, Serialize)]
struct EraseBody {
    #[serde(flatten)]
    source: ImageSource,
    content_moderation: bool,
}
