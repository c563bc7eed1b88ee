//! Packshot: product cut out onto a neutral background.

use crate::error::Result;
use crate::operations::types::{non_empty, require_bytes};
use serde::Serialize;

/// Default packshot background.
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// A request to turn a product photo into a catalog packshot.
#[derive(Debug, Clone)]
pub struct PackshotRequest {
    /// Product photo.
    pub image: Vec<u8>,
    /// Hex color or `transparent`.
    pub background_color: String,
    /// Optional SKU identifier.
    pub sku: Option<String>,
    /// Remove the background even if the image already has alpha.
    pub force_rmbg: bool,
    /// Ask the service to moderate input and output.
    pub content_moderation: bool,
}

impl PackshotRequest {
    /// Creates a request with a white background.
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            background_color: DEFAULT_BACKGROUND.into(),
            sku: None,
            force_rmbg: false,
            content_moderation: false,
        }
    }

    /// Sets the background color.
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    /// Sets the SKU identifier.
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Forces background removal.
    pub fn with_force_rmbg(mut self, force: bool) -> Self {
        self.force_rmbg = force;
        self
    }

    /// Enables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = enabled;
        self
    }

    pub(crate) fn to_body(&self) -> Result<serde_json::Value> {
        let body = PackshotBody {
            file: require_bytes("image", &self.image)?,
            background_color: &self.background_color,
            sku: non_empty(&self.sku),
            force_rmbg: self.force_rmbg,
            content_moderation: self.content_moderation,
        };
        Ok(serde_json::to_value(body)?)
    }
}

#[derive(Debug, Serialize)]
struct PackshotBody<'a> {
    file: String,
    background_color: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sku: Option<String>,
    force_rmbg: bool,
    content_moderation: bool,
}
