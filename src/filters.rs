//! Local basic filters for previews and exports.
//!
//! Pure pixel transforms; nothing here touches the network.

use crate::error::{Result, StudioError};
use image::{DynamicImage, ImageFormat, Rgba};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

const BLUR_SIGMA: f32 = 1.0;
const CONTRAST_GAIN: f32 = 1.5;

/// A basic local filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicFilter {
    /// Single-channel luminance.
    Grayscale,
    /// Warm brown tone.
    Sepia,
    /// Channels scaled by 1.5, clamped.
    HighContrast,
    /// Small Gaussian blur.
    Blur,
}

impl BasicFilter {
    /// All filters, in menu order.
    pub const ALL: [BasicFilter; 4] = [
        BasicFilter::Grayscale,
        BasicFilter::Sepia,
        BasicFilter::HighContrast,
        BasicFilter::Blur,
    ];

    /// Returns the filter name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::HighContrast => "high_contrast",
            Self::Blur => "blur",
        }
    }
}

impl std::fmt::Display for BasicFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BasicFilter {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| StudioError::InvalidRequest(format!("unknown filter: {s}")))
    }
}

/// Decodes `data` and applies `filter`.
pub fn apply_filter(data: &[u8], filter: BasicFilter) -> Result<DynamicImage> {
    let img = image::load_from_memory(data)?;
    tracing::debug!(%filter, width = img.width(), height = img.height(), "applying filter");
    Ok(filter_image(&img, filter))
}

/// Applies `filter` to an already decoded image.
pub fn filter_image(img: &DynamicImage, filter: BasicFilter) -> DynamicImage {
    match filter {
        BasicFilter::Grayscale => img.grayscale(),
        BasicFilter::Sepia => map_rgb(img, sepia),
        BasicFilter::HighContrast => map_rgb(img, |[r, g, b]| {
            [boost(r), boost(g), boost(b)]
        }),
        BasicFilter::Blur => img.blur(BLUR_SIGMA),
    }
}

/// Encodes an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

fn map_rgb(img: &DynamicImage, f: impl Fn([u8; 3]) -> [u8; 3]) -> DynamicImage {
    let mut rgba = img.to_rgba8();
    for Rgba([r, g, b, _]) in rgba.pixels_mut() {
        [*r, *g, *b] = f([*r, *g, *b]);
    }
    DynamicImage::ImageRgba8(rgba)
}

fn sepia([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    [
        channel(0.393 * r + 0.769 * g + 0.189 * b),
        channel(0.349 * r + 0.686 * g + 0.168 * b),
        channel(0.272 * r + 0.534 * g + 0.131 * b),
    ]
}

fn boost(v: u8) -> u8 {
    channel(v as f32 * CONTRAST_GAIN)
}

// Truncates toward zero like an integer cast, then saturates.
fn channel(v: f32) -> u8 {
    v.min(255.0) as u8
}
