//! Lifestyle shots: a product composited into a generated scene, described
//! either by text or by a reference image.
//!
//! Placement fields are gated on [`PlacementType`]; the service rejects
//! fields that do not belong to the selected placement, so
//! [`PlacementSettings`] only ever emits the applicable ones.

use crate::error::{Result, StudioError};
use crate::operations::types::{
    clamp_num_results, encode_base64, non_empty, require_bytes, ManualPlacement, PlacementType,
};
use serde::Serialize;

/// Product placement inside the generated scene.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementSettings {
    /// Placement strategy.
    pub placement_type: PlacementType,
    /// Output size `[width, height]`.
    pub shot_size: [u32; 2],
    /// Positions for manual placement.
    pub manual_placement_selection: Vec<ManualPlacement>,
    /// Padding `[left, right, top, bottom]`.
    pub padding_values: [u32; 4],
    /// Product size `[width, height]` for custom coordinates.
    pub foreground_image_size: Option<[u32; 2]>,
    /// Product position `[x, y]` for custom coordinates.
    pub foreground_image_location: Option<[i32; 2]>,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            placement_type: PlacementType::Original,
            shot_size: [1000, 1000],
            manual_placement_selection: vec![ManualPlacement::UpperLeft],
            padding_values: [0, 0, 0, 0],
            foreground_image_size: None,
            foreground_image_location: None,
        }
    }
}

impl PlacementSettings {
    /// Keeps the product where it is.
    pub fn original() -> Self {
        Self::default()
    }

    /// Lets the service choose placements for the given shot size.
    pub fn automatic(shot_size: [u32; 2]) -> Self {
        Self {
            placement_type: PlacementType::Automatic,
            shot_size,
            ..Self::default()
        }
    }

    /// Places the product at named positions.
    pub fn manual(shot_size: [u32; 2], positions: Vec<ManualPlacement>) -> Self {
        Self {
            placement_type: PlacementType::ManualPlacement,
            shot_size,
            manual_placement_selection: positions,
            ..Self::default()
        }
    }

    /// Pads the product by `[left, right, top, bottom]` pixels.
    pub fn padding(padding_values: [u32; 4]) -> Self {
        Self {
            placement_type: PlacementType::ManualPadding,
            padding_values,
            ..Self::default()
        }
    }

    /// Places the product at an explicit size and location.
    pub fn custom(shot_size: [u32; 2], size: [u32; 2], location: [i32; 2]) -> Self {
        Self {
            placement_type: PlacementType::CustomCoordinates,
            shot_size,
            foreground_image_size: Some(size),
            foreground_image_location: Some(location),
            ..Self::default()
        }
    }

    fn wire(&self) -> PlacementFields {
        let kind = self.placement_type;
        let selection = if self.manual_placement_selection.is_empty() {
            vec![ManualPlacement::UpperLeft]
        } else {
            self.manual_placement_selection.clone()
        };

        PlacementFields {
            placement_type: kind.as_str(),
            shot_size: kind.uses_shot_size().then_some(self.shot_size),
            manual_placement_selection: kind
                .uses_manual_selection()
                .then(|| selection.iter().map(|p| p.as_str()).collect()),
            padding_values: kind.uses_padding().then_some(self.padding_values),
            foreground_image_size: self
                .foreground_image_size
                .filter(|_| kind.uses_foreground_geometry()),
            foreground_image_location: self
                .foreground_image_location
                .filter(|_| kind.uses_foreground_geometry()),
        }
    }
}

#[derive(Debug, Serialize)]
struct PlacementFields {
    placement_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    shot_size: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manual_placement_selection: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    padding_values: Option<[u32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    foreground_image_size: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    foreground_image_location: Option<[i32; 2]>,
}

/// Fields shared by both lifestyle variants.
#[derive(Debug, Serialize)]
struct CommonFields {
    num_results: u32,
    sync: bool,
    original_quality: bool,
    force_rmbg: bool,
    content_moderation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    sku: Option<String>,
}

/// A lifestyle shot driven by a scene description.
#[derive(Debug, Clone)]
pub struct LifestyleTextRequest {
    /// Product photo.
    pub image: Vec<u8>,
    /// Text description of the scene.
    pub scene_description: String,
    /// Product placement.
    pub placement: PlacementSettings,
    /// Requested number of results (sent clamped to 1-4).
    pub num_results: u32,
    /// Block until results are final.
    pub sync: bool,
    /// Faster, lower-fidelity mode.
    pub fast: bool,
    /// Let the service rewrite the scene description.
    pub optimize_description: bool,
    /// Keep the source resolution.
    pub original_quality: bool,
    /// Elements to keep out of the scene. Only honored when `fast` is off.
    pub exclude_elements: Option<String>,
    /// Optional SKU identifier.
    pub sku: Option<String>,
    /// Remove the background even if the image already has alpha.
    pub force_rmbg: bool,
    /// Ask the service to moderate input and output.
    pub content_moderation: bool,
}

impl LifestyleTextRequest {
    /// Creates an asynchronous request for four results.
    pub fn new(image: Vec<u8>, scene_description: impl Into<String>) -> Self {
        Self {
            image,
            scene_description: scene_description.into(),
            placement: PlacementSettings::default(),
            num_results: 4,
            sync: false,
            fast: true,
            optimize_description: true,
            original_quality: false,
            exclude_elements: None,
            sku: None,
            force_rmbg: false,
            content_moderation: false,
        }
    }

    /// Sets the placement.
    pub fn with_placement(mut self, placement: PlacementSettings) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the requested number of results.
    pub fn with_num_results(mut self, n: u32) -> Self {
        self.num_results = n;
        self
    }

    /// Sets synchronous mode.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Sets fast mode.
    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    /// Sets elements to exclude (requires fast mode off).
    pub fn with_exclude_elements(mut self, elements: impl Into<String>) -> Self {
        self.exclude_elements = Some(elements.into());
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
        if self.scene_description.trim().is_empty() {
            return Err(StudioError::InvalidRequest(
                "scene description must not be empty".into(),
            ));
        }

        let body = LifestyleTextBody {
            file: require_bytes("image", &self.image)?,
            scene_description: &self.scene_description,
            placement: self.placement.wire(),
            common: CommonFields {
                num_results: clamp_num_results(self.num_results),
                sync: self.sync,
                original_quality: self.original_quality,
                force_rmbg: self.force_rmbg,
                content_moderation: self.content_moderation,
                sku: non_empty(&self.sku),
            },
            fast: self.fast,
            optimize_description: self.optimize_description,
            exclude_elements: if self.fast {
                None
            } else {
                non_empty(&self.exclude_elements)
            },
        };
        Ok(serde_json::to_value(body)?)
    }
}

#[derive(Debug, Serialize)]
struct LifestyleTextBody<'a> {
    file: String,
    scene_description: &'a str,
    #[serde(flatten)]
    placement: PlacementFields,
    #[serde(flatten)]
    common: CommonFields,
    fast: bool,
    optimize_description: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    exclude_elements: Option<String>,
}

/// A lifestyle shot driven by a reference image.
#[derive(Debug, Clone)]
pub struct LifestyleImageRequest {
    /// Product photo.
    pub image: Vec<u8>,
    /// Reference scene image.
    pub reference_image: Vec<u8>,
    /// Product placement.
    pub placement: PlacementSettings,
    /// Requested number of results (sent clamped to 1-4).
    pub num_results: u32,
    /// Block until results are final.
    pub sync: bool,
    /// Keep the source resolution.
    pub original_quality: bool,
    /// Improve lighting, shadows and texture of the reference.
    pub enhance_ref_image: bool,
    /// Similarity to the reference, 0.0-1.0.
    pub ref_image_influence: f64,
    /// Optional SKU identifier.
    pub sku: Option<String>,
    /// Remove the background even if the image already has alpha.
    pub force_rmbg: bool,
    /// Ask the service to moderate input and output.
    pub content_moderation: bool,
}

impl LifestyleImageRequest {
    /// Creates an asynchronous request for four results.
    pub fn new(image: Vec<u8>, reference_image: Vec<u8>) -> Self {
        Self {
            image,
            reference_image,
            placement: PlacementSettings::default(),
            num_results: 4,
            sync: false,
            original_quality: false,
            enhance_ref_image: true,
            ref_image_influence: 1.0,
            sku: None,
            force_rmbg: false,
            content_moderation: false,
        }
    }

    /// Sets the placement.
    pub fn with_placement(mut self, placement: PlacementSettings) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the requested number of results.
    pub fn with_num_results(mut self, n: u32) -> Self {
        self.num_results = n;
        self
    }

    /// Sets synchronous mode.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Sets reference enhancement.
    pub fn with_enhance_ref_image(mut self, enhance: bool) -> Self {
        self.enhance_ref_image = enhance;
        self
    }

    /// Sets reference influence.
    pub fn with_ref_influence(mut self, influence: f64) -> Self {
        self.ref_image_influence = influence;
        self
    }

    /// Enables content moderation.
    pub fn with_content_moderation(mut self, enabled: bool) -> Self {
        self.content_moderation = enabled;
        self
    }

    pub(crate) fn to_body(&self) -> Result<serde_json::Value> {
        if self.reference_image.is_empty() {
            return Err(StudioError::InvalidRequest(
                "reference image must not be empty".into(),
            ));
        }

        let body = LifestyleImageBody {
            file: require_bytes("image", &self.image)?,
            ref_image_file: encode_base64(&self.reference_image),
            placement: self.placement.wire(),
            common: CommonFields {
                num_results: clamp_num_results(self.num_results),
                sync: self.sync,
                original_quality: self.original_quality,
                force_rmbg: self.force_rmbg,
                content_moderation: self.content_moderation,
                sku: non_empty(&self.sku),
            },
            enhance_ref_image: self.enhance_ref_image,
            ref_image_influence: self.ref_image_influence.clamp(0.0, 1.0),
        };
        Ok(serde_json::to_value(body)?)
    }
}

#[derive(Debug, Serialize)]
struct LifestyleImageBody {
    file: String,
    ref_image_file: String,
    #[serde(flatten)]
    placement: PlacementFields,
    #[serde(flatten)]
    common: CommonFields,
    enhance_ref_image: bool,
    ref_image_influence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_body(placement: PlacementSettings) -> serde_json::Value {
        LifestyleTextRequest::new(vec![1, 2], "on a marble kitchen counter")
            .with_placement(placement)
            .to_body()
            .unwrap()
    }

    #[test]
    fn test_shot_size_only_for_applicable_placements() {
        assert!(text_body(PlacementSettings::original()).get("shot_size").is_none());
        assert!(text_body(PlacementSettings::padding([1, 2, 3, 4]))
            .get("shot_size")
            .is_none());

        assert_eq!(
            text_body(PlacementSettings::automatic([800, 600]))["shot_size"],
            json!([800, 600])
        );
        assert_eq!(
            text_body(PlacementSettings::custom([1000, 1000], [500, 500], [10, -20]))["shot_size"],
            json!([1000, 1000])
        );
    }

    #[test]
    fn test_manual_placement_fields() {
        let body = text_body(PlacementSettings::manual(
            [1000, 1000],
            vec![ManualPlacement::BottomRight, ManualPlacement::CenterHorizontal],
        ));
        assert_eq!(body["placement_type"], "manual_placement");
        assert_eq!(
            body["manual_placement_selection"],
            json!(["bottom_right", "center_horizontal"])
        );
        assert!(body.get("padding_values").is_none());
        assert!(body.get("foreground_image_size").is_none());

        let body = text_body(PlacementSettings::manual([1000, 1000], Vec::new()));
        assert_eq!(body["manual_placement_selection"], json!(["upper_left"]));
    }

    #[test]
    fn test_padding_and_custom_fields() {
        let body = text_body(PlacementSettings::padding([5, 6, 7, 8]));
        assert_eq!(body["padding_values"], json!([5, 6, 7, 8]));
        assert!(body.get("manual_placement_selection").is_none());

        let body = text_body(PlacementSettings::custom([1000, 1000], [400, 300], [-5, 40]));
        assert_eq!(body["foreground_image_size"], json!([400, 300]));
        assert_eq!(body["foreground_image_location"], json!([-5, 40]));
        assert!(body.get("padding_values").is_none());
    }

    #[test]
    fn test_foreground_geometry_dropped_outside_custom() {
        let mut placement = PlacementSettings::automatic([1000, 1000]);
        placement.foreground_image_size = Some([10, 10]);
        placement.foreground_image_location = Some([1, 1]);
        let body = text_body(placement);
        assert!(body.get("foreground_image_size").is_none());
        assert!(body.get("foreground_image_location").is_none());
    }

    #[test]
    fn test_num_results_clamped() {
        let body = LifestyleTextRequest::new(vec![1], "beach")
            .with_num_results(8)
            .to_body()
            .unwrap();
        assert_eq!(body["num_results"], 4);

        let body = LifestyleTextRequest::new(vec![1], "beach")
            .with_num_results(0)
            .to_body()
            .unwrap();
        assert_eq!(body["num_results"], 1);
    }

    #[test]
    fn test_exclude_elements_requires_slow_mode() {
        let body = LifestyleTextRequest::new(vec![1], "forest")
            .with_exclude_elements("people")
            .to_body()
            .unwrap();
        assert!(body.get("exclude_elements").is_none());

        let body = LifestyleTextRequest::new(vec![1], "forest")
            .with_fast(false)
            .with_exclude_elements("people")
            .to_body()
            .unwrap();
        assert_eq!(body["exclude_elements"], "people");
        assert_eq!(body["fast"], false);
    }

    #[test]
    fn test_empty_scene_rejected() {
        let err = LifestyleTextRequest::new(vec![1], "  ").to_body().unwrap_err();
        assert!(matches!(err, StudioError::InvalidRequest(_)));
    }

    #[test]
    fn test_by_image_body() {
        let body = LifestyleImageRequest::new(vec![1], vec![2])
            .with_ref_influence(1.7)
            .with_sync(true)
            .to_body()
            .unwrap();
        assert_eq!(body["file"], "AQ==");
        assert_eq!(body["ref_image_file"], "Ag==");
        assert_eq!(body["ref_image_influence"], 1.0);
        assert_eq!(body["enhance_ref_image"], true);
        assert_eq!(body["sync"], true);
        assert_eq!(body["placement_type"], "original");
        assert!(body.get("scene_description").is_none());
    }

    #[test]
    fn test_by_image_requires_reference() {
        let err = LifestyleImageRequest::new(vec![1], Vec::new())
            .to_body()
            .unwrap_err();
        assert!(matches!(err, StudioError::InvalidRequest(_)));
    }
}
