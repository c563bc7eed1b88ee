//! Prompt-conditioned HD image synthesis.

use crate::error::{Result, StudioError};
use crate::operations::types::{
    clamp_guidance, clamp_num_results, clamp_steps, AspectRatio, Medium,
};
use serde::Serialize;

/// Default model version in the endpoint path.
pub const DEFAULT_MODEL_VERSION: &str = "2.2";

/// A request to generate images from a text prompt.
#[derive(Debug, Clone)]
pub struct HdGenerateRequest {
    /// The text prompt describing the desired image.
    pub prompt: String,
    /// Model version used in the path.
    pub model_version: String,
    /// Requested number of images (sent clamped to 1-4).
    pub num_results: u32,
    /// Aspect ratio; omitted when unset.
    pub aspect_ratio: Option<AspectRatio>,
    /// Block until results are final.
    pub sync: bool,
    /// Seed for deterministic generation.
    pub seed: Option<u64>,
    /// Elements to exclude. Always sent, empty by default.
    pub negative_prompt: String,
    /// Refinement steps (sent clamped to 20-50).
    pub steps_num: Option<u32>,
    /// Prompt adherence (sent clamped to 1-10).
    pub text_guidance_scale: Option<f64>,
    /// Rendering medium.
    pub medium: Option<Medium>,
    /// Let the service rewrite the prompt.
    pub prompt_enhancement: bool,
    /// Post-process for quality.
    pub enhance_image: bool,
    /// Ask the service to moderate input and output.
    pub content_moderation: bool,
    /// Flag potential IP content.
    pub ip_signal: bool,
}

impl HdGenerateRequest {
    /// Creates a synchronous single-image request.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model_version: DEFAULT_MODEL_VERSION.into(),
            num_results: 1,
            aspect_ratio: Some(AspectRatio::Square),
            sync: true,
            seed: None,
            negative_prompt: String::new(),
            steps_num: None,
            text_guidance_scale: None,
            medium: None,
            prompt_enhancement: false,
            enhance_image: false,
            content_moderation: false,
            ip_signal: false,
        }
    }

    /// Sets the model version.
    pub fn with_model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = version.into();
        self
    }

    /// Sets the requested number of images.
    pub fn with_num_results(mut self, n: u32) -> Self {
        self.num_results = n;
        self
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
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

    /// Sets the negative prompt.
    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = negative.into();
        self
    }

    /// Sets refinement steps.
    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps_num = Some(steps);
        self
    }

    /// Sets text guidance scale.
    pub fn with_guidance(mut self, scale: f64) -> Self {
        self.text_guidance_scale = Some(scale);
        self
    }

    /// Sets the rendering medium.
    pub fn with_medium(mut self, medium: Medium) -> Self {
        self.medium = Some(medium);
        self
    }

    /// Enables image quality enhancement.
    pub fn with_enhance_image(mut self, enabled: bool) -> Self {
        self.enhance_image = enabled;
        self
    }

    /// Enables server-side prompt enhancement.
    pub fn with_prompt_enhancement(mut self, enabled: bool) -> Self {
        self.prompt_enhancement = enabled;
        self
    }

    /// Enables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = enabled;
        self
    }

    pub(crate) fn path(&self) -> String {
        format!("/text-to-image/hd/{}", self.model_version)
    }

    pub(crate) fn to_body(&self) -> Result<serde_json::Value> {
        if self.prompt.trim().is_empty() {
            return Err(StudioError::InvalidRequest(
                "prompt is required for image generation".into(),
            ));
        }
        if self.model_version.trim().is_empty() || self.model_version.contains('/') {
            return Err(StudioError::InvalidRequest(format!(
                "invalid model version: {:?}",
                self.model_version
            )));
        }

        let body = HdBody {
            prompt: &self.prompt,
            num_results: clamp_num_results(self.num_results),
            sync: self.sync,
            negative_prompt: &self.negative_prompt,
            aspect_ratio: self.aspect_ratio.map(|ar| ar.as_str()),
            seed: self.seed,
            steps_num: self.steps_num.map(clamp_steps),
            text_guidance_scale: self.text_guidance_scale.map(clamp_guidance),
            medium: self.medium.map(|m| m.as_str()),
            prompt_enhancement: self.prompt_enhancement.then_some(true),
            enhance_image: self.enhance_image.then_some(true),
            content_moderation: self.content_moderation.then_some(true),
            ip_signal: self.ip_signal.then_some(true),
        };
        Ok(serde_json::to_value(body)?)
    }
}

#[derive(Debug, Serialize)]
struct HdBody<'a> {
    prompt: &'a str,
    num_results: u32,
    sync: bool,
    negative_prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    steps_num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_guidance_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    medium: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_enhancement: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enhance_image: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_moderation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip_signal: Option<bool>,
}
