//! Shared parameter types for studio operations.

use crate::error::{Result, StudioError};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Accepted range for `num_results`.
pub const NUM_RESULTS_RANGE: (u32, u32) = (1, 4);
/// Accepted range for HD `steps_num`.
pub const STEPS_RANGE: (u32, u32) = (20, 50);
/// Accepted range for HD `text_guidance_scale`.
pub const GUIDANCE_RANGE: (f64, f64) = (1.0, 10.0);

/// Clamps a requested result count into the range the service accepts.
pub fn clamp_num_results(n: u32) -> u32 {
    n.clamp(NUM_RESULTS_RANGE.0, NUM_RESULTS_RANGE.1)
}

/// Clamps refinement steps for HD generation.
pub fn clamp_steps(steps: u32) -> u32 {
    steps.clamp(STEPS_RANGE.0, STEPS_RANGE.1)
}

/// Clamps the text guidance scale for HD generation.
pub fn clamp_guidance(scale: f64) -> f64 {
    scale.clamp(GUIDANCE_RANGE.0, GUIDANCE_RANGE.1)
}

pub(crate) fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Source image for operations that accept either an upload or a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Raw image bytes, base64-encoded for transport.
    Bytes(Vec<u8>),
    /// A URL previously returned by the service.
    Url(String),
}

impl ImagePayload {
    /// Returns true if the payload carries no usable data.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(data) => data.is_empty(),
            Self::Url(url) => url.trim().is_empty(),
        }
    }
}

/// Wire form of an [`ImagePayload`]: exactly one of `file` / `image_url`.
#[derive(Debug, Default, Serialize)]
pub(crate) struct ImageSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ImageSource {
    pub(crate) fn from_payload(payload: Option<&ImagePayload>) -> Result<Self> {
        match payload {
            Some(p) if !p.is_empty() => Ok(match p {
                ImagePayload::Bytes(data) => Self {
                    file: Some(encode_base64(data)),
                    image_url: None,
                },
                ImagePayload::Url(url) => Self {
                    file: None,
                    image_url: Some(url.clone()),
                },
            }),
            _ => Err(StudioError::InvalidRequest(
                "either image bytes or an image URL must be provided".into(),
            )),
        }
    }
}

/// Encodes a required binary field, rejecting empty input.
pub(crate) fn require_bytes(field: &str, data: &[u8]) -> Result<String> {
    if data.is_empty() {
        return Err(StudioError::InvalidRequest(format!("{field} must not be empty")));
    }
    Ok(encode_base64(data))
}

/// How the product is positioned inside a lifestyle shot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementType {
    /// Keep the product where it is in the source image.
    #[default]
    Original,
    /// Let the service choose placements.
    Automatic,
    /// Place at one or more named positions.
    ManualPlacement,
    /// Surround the product with explicit padding.
    ManualPadding,
    /// Place at explicit size and coordinates.
    CustomCoordinates,
}

impl PlacementType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Automatic => "automatic",
            Self::ManualPlacement => "manual_placement",
            Self::ManualPadding => "manual_padding",
            Self::CustomCoordinates => "custom_coordinates",
        }
    }

    /// Whether `shot_size` applies to this placement.
    pub fn uses_shot_size(&self) -> bool {
        matches!(
            self,
            Self::Automatic | Self::ManualPlacement | Self::CustomCoordinates
        )
    }

    /// Whether `manual_placement_selection` applies to this placement.
    pub fn uses_manual_selection(&self) -> bool {
        matches!(self, Self::ManualPlacement)
    }

    /// Whether `padding_values` applies to this placement.
    pub fn uses_padding(&self) -> bool {
        matches!(self, Self::ManualPadding)
    }

    /// Whether foreground size/location apply to this placement.
    pub fn uses_foreground_geometry(&self) -> bool {
        matches!(self, Self::CustomCoordinates)
    }
}

impl std::fmt::Display for PlacementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named product positions for [`PlacementType::ManualPlacement`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ManualPlacement {
    #[default]
    UpperLeft,
    UpperRight,
    BottomLeft,
    BottomRight,
    RightCenter,
    LeftCenter,
    UpperCenter,
    BottomCenter,
    CenterVertical,
    CenterHorizontal,
}

impl ManualPlacement {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpperLeft => "upper_left",
            Self::UpperRight => "upper_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomRight => "bottom_right",
            Self::RightCenter => "right_center",
            Self::LeftCenter => "left_center",
            Self::UpperCenter => "upper_center",
            Self::BottomCenter => "bottom_center",
            Self::CenterVertical => "center_vertical",
            Self::CenterHorizontal => "center_horizontal",
        }
    }
}

/// Shadow style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowType {
    /// Contact shadow under the product.
    #[default]
    Regular,
    /// Detached shadow for a floating look.
    Float,
}

impl ShadowType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Float => "float",
        }
    }
}

/// How a generative-fill mask was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskType {
    /// Drawn by the user.
    #[default]
    Manual,
    /// Produced by automatic segmentation.
    Automatic,
}

impl MaskType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
        }
    }
}

/// Output aspect ratios accepted by HD generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square aspect ratio.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 2:3 portrait aspect ratio.
    #[serde(rename = "2:3")]
    TwoThree,
    /// 3:2 landscape aspect ratio.
    #[serde(rename = "3:2")]
    ThreeTwo,
    /// 3:4 standard portrait aspect ratio.
    #[serde(rename = "3:4")]
    StandardPortrait,
    /// 4:3 standard landscape aspect ratio.
    #[serde(rename = "4:3")]
    Standard,
    /// 4:5 portrait aspect ratio.
    #[serde(rename = "4:5")]
    FourFive,
    /// 5:4 landscape aspect ratio.
    #[serde(rename = "5:4")]
    FiveFour,
    /// 9:16 portrait (tall) aspect ratio.
    #[serde(rename = "9:16")]
    Portrait,
    /// 16:9 landscape (widescreen) aspect ratio.
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::TwoThree => "2:3",
            Self::ThreeTwo => "3:2",
            Self::StandardPortrait => "3:4",
            Self::Standard => "4:3",
            Self::FourFive => "4:5",
            Self::FiveFour => "5:4",
            Self::Portrait => "9:16",
            Self::Landscape => "16:9",
        }
    }

    /// Parses the `W:H` form.
    pub fn parse(s: &str) -> Option<Self> {
        [
            Self::Square,
            Self::TwoThree,
            Self::ThreeTwo,
            Self::StandardPortrait,
            Self::Standard,
            Self::FourFive,
            Self::FiveFour,
            Self::Portrait,
            Self::Landscape,
        ]
        .into_iter()
        .find(|ar| ar.as_str() == s.trim())
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rendering medium for HD generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    /// Photographic output.
    Photography,
    /// Illustrative output.
    Art,
}

impl Medium {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photography => "photography",
            Self::Art => "art",
        }
    }
}

/// Drops blank optional strings so they are omitted from the body.
pub(crate) fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
