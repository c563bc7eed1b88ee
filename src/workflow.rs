//! Batch ad-set generation.

use crate::client::StudioClient;
use crate::error::Result;
use crate::normalize::CanonicalResult;
use crate::operations::{
    AspectRatio, HdGenerateRequest, LifestyleTextRequest, OperationRequest, PackshotRequest,
    ShadowRequest, ShadowType, DEFAULT_BACKGROUND,
};
use serde::{Deserialize, Serialize};

/// Which steps to run and with what settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdSetConfig {
    /// Run the packshot step.
    pub create_packshot: bool,
    /// Run the shadow step.
    pub add_shadow: bool,
    /// Run the lifestyle-by-text step.
    pub lifestyle_shot: bool,
    /// Packshot background.
    pub background_color: String,
    /// `regular` or `float`; anything else is treated as `regular`.
    pub shadow_type: String,
    /// Scene for the lifestyle step.
    pub scene_description: String,
    /// Results per generative step.
    pub num_results: u32,
    /// Aspect ratio for HD generation, e.g. `1:1`.
    pub aspect_ratio: String,
    /// Synchronous mode for the lifestyle step. HD generation always blocks.
    pub sync: bool,
}

impl Default for AdSetConfig {
    fn default() -> Self {
        Self {
            create_packshot: false,
            add_shadow: false,
            lifestyle_shot: false,
            background_color: DEFAULT_BACKGROUND.to_string(),
            shadow_type: "regular".into(),
            scene_description: String::new(),
            num_results: 1,
            aspect_ratio: "1:1".into(),
            sync: true,
        }
    }
}

impl AdSetConfig {
    fn shadow_type(&self) -> ShadowType {
        match self.shadow_type.trim().to_ascii_lowercase().as_str() {
            "float" => ShadowType::Float,
            _ => ShadowType::Regular,
        }
    }

    fn aspect_ratio(&self) -> AspectRatio {
        AspectRatio::parse(&self.aspect_ratio).unwrap_or_else(|| {
            tracing::warn!(ratio = %self.aspect_ratio, "unknown aspect ratio, using 1:1");
            AspectRatio::Square
        })
    }
}

/// Results of one ad-set run, one entry per step that ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdSet {
    /// HD generation, when started from a prompt.
    pub hd_image: Option<CanonicalResult>,
    /// Packshot step.
    pub packshot: Option<CanonicalResult>,
    /// Shadow step.
    pub shadow: Option<CanonicalResult>,
    /// Lifestyle step.
    pub lifestyle: Option<CanonicalResult>,
}

/// Generates a set of product ads.
///
/// With a prompt and no image, an HD image is generated synchronously first
/// and its first ready result downloaded as the working image. The
/// configured steps then run against the working image.
///
/// Every request is validated before the first call goes out, so a bad
/// step never fails after earlier steps were already submitted.
pub async fn generate_ad_set(
    client: &StudioClient,
    image: Option<Vec<u8>>,
    prompt: Option<&str>,
    config: &AdSetConfig,
) -> Result<AdSet> {
    let mut set = AdSet::default();
    let image = image.filter(|bytes| !bytes.is_empty());
    let prompt = prompt.map(str::trim).filter(|p| !p.is_empty());

    let hd_request: Option<OperationRequest> = match (&image, prompt) {
        (None, Some(prompt)) => Some(
            HdGenerateRequest::new(prompt)
                .with_num_results(config.num_results)
                .with_aspect_ratio(config.aspect_ratio())
                .with_sync(true)
                .into(),
        ),
        _ => None,
    };
    if image.is_none() && hd_request.is_none() {
        return Ok(set);
    }

    if let Some(request) = &hd_request {
        request.to_body()?;
    }
    let mut steps = config.step_requests(image.as_deref().unwrap_or(STAND_IN_IMAGE));
    for (_, request) in &steps {
        request.to_body()?;
    }

    if let Some(request) = hd_request {
        let result = client.run(&request).await?;
        let working = match result.first_ready() {
            Some(url) => Some(client.download(url).await?),
            None => None,
        };
        set.hd_image = Some(result);

        match working {
            Some(bytes) => steps = config.step_requests(&bytes),
            None => {
                tracing::warn!("HD generation produced no ready image, skipping ad steps");
                return Ok(set);
            }
        }
    }

    for (step, request) in steps {
        let result = client.run(&request).await?;
        match step {
            AdStep::Packshot => set.packshot = Some(result),
            AdStep::Shadow => set.shadow = Some(result),
            AdStep::Lifestyle => set.lifestyle = Some(result),
        }
    }

    tracing::info!(
        packshot = set.packshot.is_some(),
        shadow = set.shadow.is_some(),
        lifestyle = set.lifestyle.is_some(),
        "ad set complete"
    );
    Ok(set)
}

// Placeholder image for validating steps before the HD image exists.
const STAND_IN_IMAGE: &[u8] = &[0];

#[derive(Debug, Clone, Copy)]
enum AdStep {
    Packshot,
    Shadow,
    Lifestyle,
}

impl AdSetConfig {
    fn step_requests(&self, image: &[u8]) -> Vec<(AdStep, OperationRequest)> {
        let mut steps = Vec::new();
        if self.create_packshot {
            let request = PackshotRequest::new(image.to_vec()).with_background(&self.background_color);
            steps.push((AdStep::Packshot, request.into()));
        }
        if self.add_shadow {
            let request = ShadowRequest::new()
                .with_image_bytes(image.to_vec())
                .with_shadow_type(self.shadow_type());
            steps.push((AdStep::Shadow, request.into()));
        }
        if self.lifestyle_shot {
            let request = LifestyleTextRequest::new(image.to_vec(), self.scene_description.as_str())
                .with_num_results(self.num_results)
                .with_sync(self.sync);
            steps.push((AdStep::Lifestyle, request.into()));
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{client_for, MockServer, UNREACHABLE_BASE};
    use serde_json::json;

    #[test]
    fn test_config_defaults() {
        let config: AdSetConfig = serde_json::from_str(r#"{"add_shadow": true}"#).unwrap();
        assert!(config.add_shadow);
        assert!(!config.create_packshot);
        assert_eq!(config.background_color, "#FFFFFF");
        assert_eq!(config.num_results, 1);
        assert_eq!(config.aspect_ratio(), AspectRatio::Square);
        assert!(config.sync);
    }

    #[test]
    fn test_shadow_type_mapping() {
        let mut config = AdSetConfig::default();
        assert_eq!(config.shadow_type(), ShadowType::Regular);
        config.shadow_type = "natural".into();
        assert_eq!(config.shadow_type(), ShadowType::Regular);
        config.shadow_type = "Float".into();
        assert_eq!(config.shadow_type(), ShadowType::Float);
    }

    #[tokio::test]
    async fn test_nothing_to_do_without_image_or_prompt() {
        let client = client_for(UNREACHABLE_BASE);
        let config = AdSetConfig {
            create_packshot: true,
            ..AdSetConfig::default()
        };
        let set = generate_ad_set(&client, None, Some("  "), &config).await.unwrap();
        assert_eq!(set, AdSet::default());
    }

    #[tokio::test]
    async fn test_steps_run_on_provided_image() {
        let server = MockServer::start(vec![
            (200, json!({"result_url": "https://cdn/packshot.png"}).to_string()),
            (200, json!({"result_url": "https://cdn/shadow.png"}).to_string()),
            (200, json!({"urls": ["https://cdn/scene.png"]}).to_string()),
        ])
        .await;
        let client = client_for(&server.base);
        let config = AdSetConfig {
            create_packshot: true,
            add_shadow: true,
            lifestyle_shot: true,
            background_color: "#000000".into(),
            shadow_type: "float".into(),
            scene_description: "on a marble counter".into(),
            ..AdSetConfig::default()
        };

        let set = generate_ad_set(&client, Some(vec![1, 2, 3]), Some("ignored"), &config)
            .await
            .unwrap();

        assert!(set.hd_image.is_none());
        assert_eq!(set.packshot.unwrap().first_ready(), Some("https://cdn/packshot.png"));
        assert_eq!(set.shadow.unwrap().first_ready(), Some("https://cdn/shadow.png"));
        assert_eq!(set.lifestyle.unwrap().ready_urls, vec!["https://cdn/scene.png"]);

        let recorded = server.recorded();
        assert!(recorded[0].head.starts_with("POST /product/packshot "));
        assert_eq!(recorded[0].json()["background_color"], "#000000");
        assert!(recorded[1].head.starts_with("POST /product/shadow "));
        assert_eq!(recorded[1].json()["shadow_type"], "float");
        assert!(recorded[2].head.starts_with("POST /product/lifestyle_shot_by_text "));
        assert_eq!(recorded[2].json()["scene_description"], "on a marble counter");
        assert_eq!(recorded[2].json()["file"], "AQID");
    }

    #[tokio::test]
    async fn test_hd_image_feeds_steps_synchronously() {
        let server = MockServer::start(vec![
            (200, json!({"result_url": "{base}/hd.png"}).to_string()),
            (200, "PNG".to_string()),
            (200, json!({"result_url": "https://cdn/packshot.png"}).to_string()),
        ])
        .await;
        let client = client_for(&server.base);
        let config = AdSetConfig {
            create_packshot: true,
            sync: false,
            ..AdSetConfig::default()
        };

        let set = generate_ad_set(&client, None, Some("a teapot"), &config)
            .await
            .unwrap();

        assert_eq!(
            set.hd_image.unwrap().ready_urls,
            vec![format!("{}/hd.png", server.base)]
        );
        assert_eq!(set.packshot.unwrap().first_ready(), Some("https://cdn/packshot.png"));

        let recorded = server.recorded();
        assert_eq!(recorded.len(), 3);
        assert!(recorded[0].head.starts_with("POST /text-to-image/hd/2.2 "));
        assert_eq!(recorded[0].json()["prompt"], "a teapot");
        assert_eq!(recorded[0].json()["sync"], true);
        assert!(recorded[1].head.starts_with("GET /hd.png "));
        assert!(recorded[2].head.starts_with("POST /product/packshot "));
        assert_eq!(recorded[2].json()["file"], "UE5H");
    }

    #[tokio::test]
    async fn test_hd_without_ready_image_skips_steps() {
        let server =
            MockServer::start(vec![(200, json!({"status": "queued"}).to_string())]).await;
        let client = client_for(&server.base);
        let config = AdSetConfig {
            create_packshot: true,
            ..AdSetConfig::default()
        };

        let set = generate_ad_set(&client, None, Some("a teapot"), &config)
            .await
            .unwrap();

        assert!(!set.hd_image.unwrap().is_recognized());
        assert!(set.packshot.is_none());
        assert_eq!(server.recorded().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_step_rejected_before_any_call() {
        let server = MockServer::start(vec![(
            200,
            json!({"result_url": "https://cdn/packshot.png"}).to_string(),
        )])
        .await;
        let client = client_for(&server.base);
        let config = AdSetConfig {
            create_packshot: true,
            lifestyle_shot: true,
            scene_description: String::new(),
            ..AdSetConfig::default()
        };

        let err = generate_ad_set(&client, Some(vec![1, 2, 3]), None, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::StudioError::InvalidRequest(_)));

        let err = generate_ad_set(&client, None, Some("a teapot"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::StudioError::InvalidRequest(_)));

        assert!(server.recorded().is_empty());
    }
}
