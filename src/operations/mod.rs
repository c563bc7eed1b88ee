//! Remote operations and their request contracts.
//!
//! Each operation owns its parameter set and knows how to render it as the
//! JSON body the service expects. [`OperationRequest`] is the tagged union the
//! client submits.

mod erase;
mod gen_fill;
mod hd;
mod lifestyle;
mod packshot;
mod prompt;
mod shadow;
pub mod types;

pub use erase::EraseForegroundRequest;
pub use gen_fill::GenFillRequest;
pub use hd::{HdGenerateRequest, DEFAULT_MODEL_VERSION};
pub use lifestyle::{LifestyleImageRequest, LifestyleTextRequest, PlacementSettings};
pub use packshot::{PackshotRequest, DEFAULT_BACKGROUND};
pub use prompt::{extract_enhanced, PromptEnhanceRequest};
pub use shadow::ShadowRequest;
pub use types::{
    AspectRatio, ImagePayload, ManualPlacement, MaskType, Medium, PlacementType, ShadowType,
};

use crate::error::Result;
use crate::operations::types::clamp_num_results;
use serde::{Deserialize, Serialize};

/// Operation discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Catalog packshot.
    Packshot,
    /// Shadow synthesis.
    Shadow,
    /// Lifestyle shot from a scene description.
    LifestyleByText,
    /// Lifestyle shot from a reference image.
    LifestyleByImage,
    /// Masked in-painting.
    GenerativeFill,
    /// Foreground erasure.
    EraseForeground,
    /// Text-to-image HD generation.
    HdGenerate,
    /// Prompt rewriting.
    PromptEnhance,
}

impl OperationKind {
    /// Returns a short name for logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Packshot => "packshot",
            Self::Shadow => "shadow",
            Self::LifestyleByText => "lifestyle_shot_by_text",
            Self::LifestyleByImage => "lifestyle_shot_by_image",
            Self::GenerativeFill => "gen_fill",
            Self::EraseForeground => "erase_foreground",
            Self::HdGenerate => "hd_generate",
            Self::PromptEnhance => "prompt_enhancer",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Any request the studio can submit.
#[derive(Debug, Clone)]
pub enum OperationRequest {
    /// See [`PackshotRequest`].
    Packshot(PackshotRequest),
    /// See [`ShadowRequest`].
    Shadow(ShadowRequest),
    /// See [`LifestyleTextRequest`].
    LifestyleByText(LifestyleTextRequest),
    /// See [`LifestyleImageRequest`].
    LifestyleByImage(LifestyleImageRequest),
    /// See [`GenFillRequest`].
    GenerativeFill(GenFillRequest),
    /// See [`EraseForegroundRequest`].
    EraseForeground(EraseForegroundRequest),
    /// See [`HdGenerateRequest`].
    HdGenerate(HdGenerateRequest),
    /// See [`PromptEnhanceRequest`].
    PromptEnhance(PromptEnhanceRequest),
}

impl OperationRequest {
    /// Returns the operation discriminant.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Packshot(_) => OperationKind::Packshot,
            Self::Shadow(_) => OperationKind::Shadow,
            Self::LifestyleByText(_) => OperationKind::LifestyleByText,
            Self::LifestyleByImage(_) => OperationKind::LifestyleByImage,
            Self::GenerativeFill(_) => OperationKind::GenerativeFill,
            Self::EraseForeground(_) => OperationKind::EraseForeground,
            Self::HdGenerate(_) => OperationKind::HdGenerate,
            Self::PromptEnhance(_) => OperationKind::PromptEnhance,
        }
    }

    /// Endpoint path relative to the API base.
    pub fn path(&self) -> String {
        match self {
            Self::Packshot(_) => "/product/packshot".into(),
            Self::Shadow(_) => "/product/shadow".into(),
            Self::LifestyleByText(_) => "/product/lifestyle_shot_by_text".into(),
            Self::LifestyleByImage(_) => "/product/lifestyle_shot_by_image".into(),
            Self::GenerativeFill(_) => "/gen_fill".into(),
            Self::EraseForeground(_) => "/erase_foreground".into(),
            Self::HdGenerate(req) => req.path(),
            Self::PromptEnhance(_) => "/prompt_enhancer".into(),
        }
    }

    /// Whether the service returns final results in the submission response.
    ///
    /// Operations without a `sync` parameter always block server-side.
    pub fn is_sync(&self) -> bool {
        match self {
            Self::LifestyleByText(req) => req.sync,
            Self::LifestyleByImage(req) => req.sync,
            Self::GenerativeFill(req) => req.sync,
            Self::HdGenerate(req) => req.sync,
            Self::Packshot(_) | Self::Shadow(_) | Self::EraseForeground(_) | Self::PromptEnhance(_) => {
                true
            }
        }
    }

    /// Number of results the service was asked for, after clamping.
    pub fn requested_results(&self) -> Option<usize> {
        let n = match self {
            Self::LifestyleByText(req) => req.num_results,
            Self::LifestyleByImage(req) => req.num_results,
            Self::GenerativeFill(req) => req.num_results,
            Self::HdGenerate(req) => req.num_results,
            _ => return None,
        };
        Some(clamp_num_results(n) as usize)
    }

    /// Renders the JSON body, validating parameters first.
    pub fn to_body(&self) -> Result<serde_json::Value> {
        match self {
            Self::Packshot(req) => req.to_body(),
            Self::Shadow(req) => req.to_body(),
            Self::LifestyleByText(req) => req.to_body(),
            Self::LifestyleByImage(req) => req.to_body(),
            Self::GenerativeFill(req) => req.to_body(),
            Self::EraseForeground(req) => req.to_body(),
            Self::HdGenerate(req) => req.to_body(),
            Self::PromptEnhance(req) => req.to_body(),
        }
    }
}

macro_rules! impl_from_request {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for OperationRequest {
                fn from(req: $ty) -> Self {
                    Self::$variant(req)
                }
            }
        )*
    };
}

impl_from_request!(
    Packshot(PackshotRequest),
    Shadow(ShadowRequest),
    LifestyleByText(LifestyleTextRequest),
    LifestyleByImage(LifestyleImageRequest),
    GenerativeFill(GenFillRequest),
    EraseForeground(EraseForegroundRequest),
    HdGenerate(HdGenerateRequest),
    PromptEnhance(PromptEnhanceRequest),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let cases: Vec<(OperationRequest, &str)> = vec![
            (PackshotRequest::new(vec![1]).into(), "/product/packshot"),
            (ShadowRequest::new().into(), "/product/shadow"),
            (
                LifestyleTextRequest::new(vec![1], "x").into(),
                "/product/lifestyle_shot_by_text",
            ),
            (
                LifestyleImageRequest::new(vec![1], vec![2]).into(),
                "/product/lifestyle_shot_by_image",
            ),
            (GenFillRequest::new(vec![1], vec![2], "x").into(), "/gen_fill"),
            (EraseForegroundRequest::default().into(), "/erase_foreground"),
            (
                HdGenerateRequest::new("x").with_model_version("3.1").into(),
                "/text-to-image/hd/3.1",
            ),
            (PromptEnhanceRequest::new("x").into(), "/prompt_enhancer"),
        ];
        for (req, path) in cases {
            assert_eq!(req.path(), path, "{}", req.kind());
        }
    }

    #[test]
    fn test_sync_and_requested_results() {
        let req: OperationRequest = GenFillRequest::new(vec![1], vec![2], "x")
            .with_num_results(7)
            .into();
        assert!(!req.is_sync());
        assert_eq!(req.requested_results(), Some(4));

        let req: OperationRequest = PackshotRequest::new(vec![1]).into();
        assert!(req.is_sync());
        assert_eq!(req.requested_results(), None);

        let req: OperationRequest = HdGenerateRequest::new("x").into();
        assert!(req.is_sync());
        assert_eq!(req.requested_results(), Some(1));
    }

    #[test]
    fn test_to_body_dispatches_validation() {
        let req: OperationRequest = ShadowRequest::new().into();
        assert!(matches!(
            req.to_body(),
            Err(crate::error::StudioError::InvalidRequest(_))
        ));
    }
}
