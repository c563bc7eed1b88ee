//! Generative fill: in-paint a masked region from a text prompt.

use crate::error::{Result, StudioError};
use crate::operations::types::{clamp_num_results, non_empty, require_bytes, MaskType};
use serde::Serialize;

/// A request to fill a masked region of an image.
#[derive(Debug, Clone)]
pub struct GenFillRequest {
    /// Source image.
    pub image: Vec<u8>,
    /// Grayscale mask; white marks the region to fill.
    pub mask: Vec<u8>,
    /// How the mask was produced.
    pub mask_type: MaskType,
    /// What to generate in the masked area.
    pub prompt: String,
    /// What to avoid.
    pub negative_prompt: Option<String>,
    /// Requested number of variations (sent clamped to 1-4).
    pub num_results: u32,
    /// Block until results are final.
    pub sync: bool,
    /// Seed for reproducible results.
    pub seed: Option<u64>,
    /// Ask the service to moderate input and output.
    pub content_moderation: bool,
}

impl GenFillRequest {
    /// Creates an asynchronous request for four variations.
    pub fn new(image: Vec<u8>, mask: Vec<u8>, prompt: impl Into<String>) -> Self {
        Self {
            image,
            mask,
            mask_type: MaskType::Manual,
            prompt: prompt.into(),
            negative_prompt: None,
            num_results: 4,
            sync: false,
            seed: None,
            content_moderation: false,
        }
    }

    /// Sets the mask type.
    pub fn with_mask_type(mut self, mask_type: MaskType) -> Self {
        self.mask_type = mask_type;
        self
    }

    /// Sets the negative prompt.
    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative.into());
        self
    }

    /// Sets the requested number of variations.
    pub fn with_num_results(mut self, n: u32) -> Self {
        self.num_results = n;
        self
    }

    /// Sets synchronous mode.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Sets the seed for deterministic generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = enabled;
        self
    }

    pub(crate) fn to_body(&self) -> Result<serde_json::Value> {
        if self.prompt.trim().is_empty() {
            return Err(StudioError::InvalidRequest("prompt must not be empty".into()));
        }

        let body = GenFillBody {
            file: require_bytes("image", &self.image)?,
            mask_file: require_bytes("mask", &self.mask)?,
            mask_type: self.mask_type.as_str(),
            prompt: &self.prompt,
            num_results: clamp_num_results(self.num_results),
            sync: self.sync,
            content_moderation: self.content_moderation,
            negative_prompt: non_empty(&self.negative_prompt),
            seed: self.seed,
        };
        Ok(serde_json::to_value(body)?)
    }
}

#[derive(Debug, Serialize)]
struct GenFillBody<'a> {
    file: String,
    mask_file: String,
    mask_type: &'static str,
    prompt: &'a str,
    num_results: u32,
    sync: bool,
    content_moderation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}
