//! Shadow synthesis under or behind a product.

use crate::error::Result;
use crate::operations::types::{non_empty, ImagePayload, ImageSource, ShadowType};
use serde::Serialize;

/// A request to add a shadow to a product image.
#[derive(Debug, Clone)]
pub struct ShadowRequest {
    /// Source image; must be set before submission.
    pub image: Option<ImagePayload>,
    /// Shadow style.
    pub shadow_type: ShadowType,
    /// Optional background; transparent when unset.
    pub background_color: Option<String>,
    /// Shadow color in hex.
    pub shadow_color: String,
    /// `[x, y]` offset in pixels.
    pub shadow_offset: [i32; 2],
    /// Intensity, 0-100.
    pub shadow_intensity: u8,
    /// Blur radius.
    pub shadow_blur: Option<u32>,
    /// Float shadow width adjustment.
    pub shadow_width: Option<i32>,
    /// Float shadow height adjustment.
    pub shadow_height: Option<i32>,
    /// Optional SKU identifier.
    pub sku: Option<String>,
    /// Remove the background even if the image already has alpha.
    pub force_rmbg: bool,
    /// Ask the service to moderate input and output.
    pub content_moderation: bool,
}

impl Default for ShadowRequest {
    fn default() -> Self {
        Self {
            image: None,
            shadow_type: ShadowType::Regular,
            background_color: None,
            shadow_color: "#000000".into(),
            shadow_offset: [0, 15],
            shadow_intensity: 60,
            shadow_blur: None,
            shadow_width: None,
            shadow_height: None,
            sku: None,
            force_rmbg: false,
            content_moderation: false,
        }
    }
}

impl ShadowRequest {
    /// Creates a request with default shadow settings and no image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses uploaded image bytes, replacing any URL.
    pub fn with_image_bytes(mut self, data: Vec<u8>) -> Self {
        self.image = Some(ImagePayload::Bytes(data));
        self
    }

    /// Uses a remote image URL, replacing any bytes.
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image = Some(ImagePayload::Url(url.into()));
        self
    }

    /// Sets the shadow style.
    pub fn with_shadow_type(mut self, shadow_type: ShadowType) -> Self {
        self.shadow_type = shadow_type;
        self
    }

    /// Sets a background color.
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    /// Sets the shadow color.
    pub fn with_shadow_color(mut self, color: impl Into<String>) -> Self {
        self.shadow_color = color.into();
        self
    }

    /// Sets the shadow offset.
    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.shadow_offset = [x, y];
        self
    }

    /// Sets the intensity (clamped to 100).
    pub fn with_intensity(mut self, intensity: u8) -> Self {
        self.shadow_intensity = intensity.min(100);
        self
    }

    /// Sets the blur radius.
    pub fn with_blur(mut self, blur: u32) -> Self {
        self.shadow_blur = Some(blur);
        self
    }

    /// Sets float shadow dimensions.
    pub fn with_float_size(mut self, width: i32, height: i32) -> Self {
        self.shadow_width = Some(width);
        self.shadow_height = Some(height);
        self
    }

    /// Sets the SKU identifier.
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Enables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = enabled;
        self
    }

    pub(crate) fn to_body(&self) -> Result<serde_json::Value> {
        let body = ShadowBody {
            source: ImageSource::from_payload(self.image.as_ref())?,
            shadow_type: self.shadow_type.as_str(),
            shadow_color: &self.shadow_color,
            shadow_intensity: self.shadow_intensity.min(100),
            shadow_offset: self.shadow_offset,
            force_rmbg: self.force_rmbg,
            content_moderation: self.content_moderation,
            background_color: non_empty(&self.background_color),
            shadow_blur: self.shadow_blur,
            shadow_width: self.shadow_width,
            shadow_height: self.shadow_height,
            sku: non_empty(&self.sku),
        };
        Ok(serde_json::to_value(body)?)
    }
}

#[derive(Debug, Serialize)]
struct ShadowBody<'a> {
    #[serde(flatten)]
    source: ImageSource,
    shadow_type: &'static str,
    shadow_color: &'a str,
    shadow_intensity: u8,
    shadow_offset: [i32; 2],
    force_rmbg: bool,
    content_moderation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shadow_blur: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shadow_width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shadow_height: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sku: Option<String>,
}
