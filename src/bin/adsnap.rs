//! CLI for AdSnap - product ad studio.

use adsnap::{
    AdSetConfig, AspectRatio, CanonicalResult, EraseForegroundRequest, GenFillRequest,
    HdGenerateRequest, HttpProber, LifestyleImageRequest, LifestyleTextRequest, ManualPlacement,
    MaskType, Medium, OperationRequest, PackshotRequest, PlacementSettings, Poller,
    ShadowRequest, ShadowType, StudioClient, StudioError, StudioSession,
};
use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "adsnap")]
#[command(about = "Product ad studio for the Bria image API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API key
    #[arg(long, global = true, env = "BRIA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL
    #[arg(long, global = true, env = "BRIA_API_BASE")]
    base_url: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Download ready images into this directory
    #[arg(long, global = true)]
    save: Option<PathBuf>,

    /// Ask the service to moderate inputs and outputs
    #[arg(long, global = true)]
    content_moderation: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a catalog packshot
    Packshot(PackshotArgs),

    /// Add a shadow to a product
    Shadow(ShadowArgs),

    /// Place a product in a scene described by text
    LifestyleText(LifestyleTextArgs),

    /// Place a product in a scene taken from a reference image
    LifestyleImage(LifestyleImageArgs),

    /// Fill a masked region from a prompt
    GenFill(GenFillArgs),

    /// Erase the foreground of an image
    Erase(SourceArgs),

    /// Generate HD images from a prompt
    Generate(GenerateArgs),

    /// Enhance a prompt
    Enhance {
        /// The prompt to enhance
        prompt: String,
    },

    /// Check whether pending result URLs are ready
    Check {
        /// URLs to probe
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Apply a local filter to an image
    #[cfg(feature = "filters")]
    Filter(FilterArgs),

    /// Run the ad-set workflow
    AdSet(AdSetArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// Input image file
    #[arg(required_unless_present = "url", conflicts_with = "url")]
    input: Option<PathBuf>,

    /// URL of a previous result instead of a file
    #[arg(long)]
    url: Option<String>,
}

impl SourceArgs {
    fn payload(&self) -> anyhow::Result<adsnap::ImagePayload> {
        match (&self.input, &self.url) {
            (Some(path), _) => Ok(adsnap::ImagePayload::Bytes(read_image(path)?)),
            (None, Some(url)) => Ok(adsnap::ImagePayload::Url(url.clone())),
            (None, None) => anyhow::bail!("an input file or --url is required"),
        }
    }
}

#[derive(Args)]
struct PackshotArgs {
    /// Product image file
    input: PathBuf,

    /// Background color
    #[arg(long, default_value = "#FFFFFF")]
    background: String,

    /// SKU identifier
    #[arg(long)]
    sku: Option<String>,

    /// Remove the background even if the image has alpha
    #[arg(long)]
    force_rmbg: bool,
}

#[derive(Args)]
struct ShadowArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Shadow type
    #[arg(long = "type", value_enum, default_value = "regular")]
    shadow_type: ShadowTypeArg,

    /// Background color (transparent when omitted)
    #[arg(long)]
    background: Option<String>,

    /// Shadow color
    #[arg(long, default_value = "#000000")]
    color: String,

    /// Shadow offset as X,Y
    #[arg(long, value_delimiter = ',', default_values_t = [0, 15])]
    offset: Vec<i32>,

    /// Shadow intensity (0-100)
    #[arg(long, default_value_t = 60)]
    intensity: u8,

    /// Shadow blur
    #[arg(long)]
    blur: Option<u32>,
}

#[derive(Args)]
struct PlacementArgs {
    /// Placement strategy
    #[arg(long, value_enum, default_value = "original")]
    placement: PlacementArg,

    /// Output size as WIDTH,HEIGHT
    #[arg(long, value_delimiter = ',', default_values_t = [1000, 1000])]
    shot_size: Vec<u32>,

    /// Positions for manual placement
    #[arg(long, value_enum, value_delimiter = ',')]
    position: Vec<PositionArg>,

    /// Padding as LEFT,RIGHT,TOP,BOTTOM
    #[arg(long, value_delimiter = ',', default_values_t = [0, 0, 0, 0])]
    padding: Vec<u32>,

    /// Foreground size as WIDTH,HEIGHT for custom coordinates
    #[arg(long, value_delimiter = ',', default_values_t = [500, 500])]
    foreground_size: Vec<u32>,

    /// Foreground location as X,Y for custom coordinates
    #[arg(long, value_delimiter = ',', default_values_t = [0, 0])]
    foreground_location: Vec<i32>,
}

impl PlacementArgs {
    fn settings(&self) -> PlacementSettings {
        let shot = pair(&self.shot_size);
        match self.placement {
            PlacementArg::Original => PlacementSettings::original(),
            PlacementArg::Automatic => PlacementSettings::automatic(shot),
            PlacementArg::Manual => PlacementSettings::manual(
                shot,
                self.position.iter().map(|&p| p.into()).collect(),
            ),
            PlacementArg::Padding => {
                let p = |i: usize| self.padding.get(i).copied().unwrap_or_default();
                PlacementSettings::padding([p(0), p(1), p(2), p(3)])
            }
            PlacementArg::Custom => PlacementSettings::custom(
                shot,
                pair(&self.foreground_size),
                pair(&self.foreground_location),
            ),
        }
    }
}

#[derive(Args)]
struct LifestyleTextArgs {
    /// Product image file
    input: PathBuf,

    /// Scene description
    scene: String,

    #[command(flatten)]
    placement: PlacementArgs,

    /// Number of results (1-4)
    #[arg(short, long, default_value_t = 4)]
    num_results: u32,

    /// Wait for final results instead of polling
    #[arg(long)]
    sync: bool,

    /// Higher fidelity, slower mode
    #[arg(long)]
    no_fast: bool,

    /// Elements to exclude (slow mode only)
    #[arg(long)]
    exclude: Option<String>,
}

#[derive(Args)]
struct LifestyleImageArgs {
    /// Product image file
    input: PathBuf,

    /// Reference scene image file
    reference: PathBuf,

    #[command(flatten)]
    placement: PlacementArgs,

    /// Number of results (1-4)
    #[arg(short, long, default_value_t = 4)]
    num_results: u32,

    /// Wait for final results instead of polling
    #[arg(long)]
    sync: bool,

    /// Reference influence (0.0-1.0)
    #[arg(long, default_value_t = 1.0)]
    influence: f64,
}

#[derive(Args)]
struct GenFillArgs {
    /// Image file
    input: PathBuf,

    /// Mask file
    mask: PathBuf,

    /// What to paint in the masked region
    prompt: String,

    /// What to avoid
    #[arg(long)]
    negative: Option<String>,

    /// Number of results (1-4)
    #[arg(short, long, default_value_t = 4)]
    num_results: u32,

    /// Wait for final results instead of polling
    #[arg(long)]
    sync: bool,

    /// Seed for deterministic generation
    #[arg(long)]
    seed: Option<u64>,

    /// Mask was produced automatically
    #[arg(long)]
    automatic_mask: bool,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Number of results (1-4)
    #[arg(short, long, default_value_t = 1)]
    num_results: u32,

    /// Aspect ratio (e.g., 1:1, 16:9)
    #[arg(long, default_value = "1:1", value_parser = parse_aspect_ratio)]
    aspect_ratio: AspectRatio,

    /// Submit asynchronously and poll for results
    #[arg(long = "async")]
    asynchronous: bool,

    /// Seed for deterministic generation
    #[arg(long)]
    seed: Option<u64>,

    /// Negative prompt
    #[arg(long)]
    negative: Option<String>,

    /// Refinement steps (20-50)
    #[arg(long)]
    steps: Option<u32>,

    /// Text guidance scale (1-10)
    #[arg(long)]
    guidance: Option<f64>,

    /// Medium
    #[arg(long, value_enum)]
    medium: Option<MediumArg>,

    /// Model version
    #[arg(long, default_value = adsnap::operations::DEFAULT_MODEL_VERSION)]
    model_version: String,

    /// Enhance the prompt before submitting
    #[arg(long)]
    enhance_prompt: bool,

    /// Ask the service to enhance image detail
    #[arg(long)]
    enhance_image: bool,
}

#[cfg(feature = "filters")]
#[derive(Args)]
struct FilterArgs {
    /// Input image file
    input: PathBuf,

    /// Filter to apply
    #[arg(value_enum)]
    filter: FilterArg,

    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct AdSetArgs {
    /// Product image file
    #[arg(long)]
    image: Option<PathBuf>,

    /// Prompt for generating the product when no image is given
    #[arg(long)]
    prompt: Option<String>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Create a packshot
    #[arg(long)]
    packshot: bool,

    /// Add a shadow
    #[arg(long)]
    shadow: bool,

    /// Create a lifestyle shot with this scene
    #[arg(long)]
    lifestyle: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShadowTypeArg {
    Regular,
    Float,
}

impl From<ShadowTypeArg> for ShadowType {
    fn from(arg: ShadowTypeArg) -> Self {
        match arg {
            ShadowTypeArg::Regular => ShadowType::Regular,
            ShadowTypeArg::Float => ShadowType::Float,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlacementArg {
    Original,
    Automatic,
    Manual,
    Padding,
    Custom,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PositionArg {
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

impl From<PositionArg> for ManualPlacement {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::UpperLeft => ManualPlacement::UpperLeft,
            PositionArg::UpperRight => ManualPlacement::UpperRight,
            PositionArg::BottomLeft => ManualPlacement::BottomLeft,
            PositionArg::BottomRight => ManualPlacement::BottomRight,
            PositionArg::RightCenter => ManualPlacement::RightCenter,
            PositionArg::LeftCenter => ManualPlacement::LeftCenter,
            PositionArg::UpperCenter => ManualPlacement::UpperCenter,
            PositionArg::BottomCenter => ManualPlacement::BottomCenter,
            PositionArg::CenterVertical => ManualPlacement::CenterVertical,
            PositionArg::CenterHorizontal => ManualPlacement::CenterHorizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MediumArg {
    Photography,
    Art,
}

impl From<MediumArg> for Medium {
    fn from(arg: MediumArg) -> Self {
        match arg {
            MediumArg::Photography => Medium::Photography,
            MediumArg::Art => Medium::Art,
        }
    }
}

#[cfg(feature = "filters")]
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    Grayscale,
    Sepia,
    HighContrast,
    Blur,
}

#[cfg(feature = "filters")]
impl From<FilterArg> for adsnap::BasicFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Grayscale => adsnap::BasicFilter::Grayscale,
            FilterArg::Sepia => adsnap::BasicFilter::Sepia,
            FilterArg::HighContrast => adsnap::BasicFilter::HighContrast,
            FilterArg::Blur => adsnap::BasicFilter::Blur,
        }
    }
}

fn parse_aspect_ratio(s: &str) -> Result<AspectRatio, String> {
    AspectRatio::parse(s).ok_or_else(|| format!("unsupported aspect ratio: {s}"))
}

fn pair<T: Copy + Default>(values: &[T]) -> [T; 2] {
    [
        values.first().copied().unwrap_or_default(),
        values.get(1).copied().unwrap_or_default(),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<StudioError>() {
            Some(studio) => eprintln!("Error: {}", studio.user_message()),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        api_key,
        base_url,
        json,
        save,
        content_moderation: moderate,
    } = cli;
    let output = Output { json, save };

    // Local commands and result-URL checks need no credentials.
    let command = match command {
        #[cfg(feature = "filters")]
        Commands::Filter(args) => return apply_filter(&args, output.json),
        Commands::Check { urls } => return check_urls(&HttpProber::new()?, urls, &output).await,
        command => command,
    };

    let client = build_client(api_key.as_deref(), base_url.as_deref())?;

    let request: OperationRequest = match command {
        Commands::Packshot(args) => {
            let mut req = PackshotRequest::new(read_image(&args.input)?)
                .with_background(args.background)
                .with_force_rmbg(args.force_rmbg)
                .with_content_moderation(moderate);
            if let Some(sku) = args.sku {
                req = req.with_sku(sku);
            }
            req.into()
        }
        Commands::Shadow(args) => {
            let [dx, dy] = pair(&args.offset);
            let mut req = ShadowRequest::new()
                .with_shadow_type(args.shadow_type.into())
                .with_shadow_color(args.color)
                .with_offset(dx, dy)
                .with_intensity(args.intensity)
                .with_content_moderation(moderate);
            req.image = Some(args.source.payload()?);
            if let Some(bg) = args.background {
                req = req.with_background(bg);
            }
            if let Some(blur) = args.blur {
                req = req.with_blur(blur);
            }
            req.into()
        }
        Commands::LifestyleText(args) => {
            let mut req = LifestyleTextRequest::new(read_image(&args.input)?, args.scene)
                .with_placement(args.placement.settings())
                .with_num_results(args.num_results)
                .with_sync(args.sync)
                .with_fast(!args.no_fast)
                .with_content_moderation(moderate);
            if let Some(exclude) = args.exclude {
                req = req.with_exclude_elements(exclude);
            }
            req.into()
        }
        Commands::LifestyleImage(args) => {
            LifestyleImageRequest::new(read_image(&args.input)?, read_image(&args.reference)?)
                .with_placement(args.placement.settings())
                .with_num_results(args.num_results)
                .with_sync(args.sync)
                .with_ref_influence(args.influence)
                .with_content_moderation(moderate)
                .into()
        }
        Commands::GenFill(args) => {
            let mut req =
                GenFillRequest::new(read_image(&args.input)?, read_image(&args.mask)?, args.prompt)
                    .with_num_results(args.num_results)
                    .with_sync(args.sync)
                    .with_content_moderation(moderate);
            if args.automatic_mask {
                req = req.with_mask_type(MaskType::Automatic);
            }
            if let Some(negative) = args.negative {
                req = req.with_negative_prompt(negative);
            }
            if let Some(seed) = args.seed {
                req = req.with_seed(seed);
            }
            req.into()
        }
        Commands::Erase(args) => {
            let req = match args.payload()? {
                adsnap::ImagePayload::Bytes(data) => EraseForegroundRequest::from_bytes(data),
                adsnap::ImagePayload::Url(url) => EraseForegroundRequest::from_url(url),
            };
            req.with_content_moderation(moderate).into()
        }
        Commands::Generate(args) => {
            let prompt = if args.enhance_prompt {
                let enhanced = client.enhance_prompt(&args.prompt).await;
                if !output.json {
                    println!("Prompt: {}", enhanced);
                }
                enhanced
            } else {
                args.prompt
            };

            let mut req = HdGenerateRequest::new(prompt)
                .with_model_version(args.model_version)
                .with_num_results(args.num_results)
                .with_aspect_ratio(args.aspect_ratio)
                .with_sync(!args.asynchronous)
                .with_enhance_image(args.enhance_image)
                .with_content_moderation(moderate);
            if let Some(seed) = args.seed {
                req = req.with_seed(seed);
            }
            if let Some(negative) = args.negative {
                req = req.with_negative_prompt(negative);
            }
            if let Some(steps) = args.steps {
                req = req.with_steps(steps);
            }
            if let Some(guidance) = args.guidance {
                req = req.with_guidance(guidance);
            }
            if let Some(medium) = args.medium {
                req = req.with_medium(medium.into());
            }
            req.into()
        }
        Commands::Enhance { prompt } => {
            let enhanced = client.enhance_prompt(&prompt).await;
            if output.json {
                let result = serde_json::json!({
                    "original": prompt,
                    "enhanced": enhanced,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", enhanced);
            }
            return Ok(());
        }
        Commands::Check { urls } => {
            return check_urls(client.prober(), urls, &output).await;
        }
        #[cfg(feature = "filters")]
        Commands::Filter(args) => {
            return apply_filter(&args, output.json);
        }
        Commands::AdSet(args) => {
            return run_ad_set(&client, args, &output).await;
        }
    };

    let mut session = StudioSession::new(client);
    let result = session.execute(&request).await?.clone();
    output.report(session.client().prober(), request.kind().as_str(), &result).await
}

fn build_client(api_key: Option<&str>, base_url: Option<&str>) -> anyhow::Result<StudioClient> {
    let mut builder = StudioClient::builder();
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    if let Some(base) = base_url {
        builder = builder.base_url(base);
    }
    Ok(builder.build()?)
}

fn read_image(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

async fn check_urls(prober: &HttpProber, urls: Vec<String>, output: &Output) -> anyhow::Result<()> {
    let poller = Poller::new();
    let mut state = poller.start(urls);
    let ready = poller.probe_round(&mut state, prober).await;

    let result = CanonicalResult {
        ready_urls: ready,
        pending_urls: state.pending().to_vec(),
        raw: serde_json::Value::Null,
        shape: None,
    };
    output.report(prober, "check", &result).await
}

async fn run_ad_set(client: &StudioClient, args: AdSetArgs, output: &Output) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)?
        }
        None => AdSetConfig::default(),
    };
    config.create_packshot |= args.packshot;
    config.add_shadow |= args.shadow;
    if let Some(scene) = args.lifestyle {
        config.lifestyle_shot = true;
        config.scene_description = scene;
    }

    let image = args.image.as_deref().map(read_image).transpose()?;
    if image.is_none() && args.prompt.is_none() {
        anyhow::bail!("ad-set needs --image or --prompt");
    }

    let set = adsnap::generate_ad_set(client, image, args.prompt.as_deref(), &config).await?;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&set)?);
    }
    let steps = [
        ("hd_image", &set.hd_image),
        ("packshot", &set.packshot),
        ("shadow", &set.shadow),
        ("lifestyle", &set.lifestyle),
    ];
    for (name, result) in steps {
        if let Some(result) = result {
            output.report_quiet(client.prober(), name, result).await?;
        }
    }
    Ok(())
}

#[cfg(feature = "filters")]
fn apply_filter(args: &FilterArgs, json_output: bool) -> anyhow::Result<()> {
    let data = read_image(&args.input)?;
    let filtered = adsnap::apply_filter(&data, args.filter.into())?;
    let bytes = adsnap::encode_png(&filtered)?;
    std::fs::write(&args.output, &bytes)?;

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "output": args.output.display().to_string(),
            "size_bytes": bytes.len(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Filtered image: {} ({} bytes)", args.output.display(), bytes.len());
    }
    Ok(())
}

struct Output {
    json: bool,
    save: Option<PathBuf>,
}

impl Output {
    async fn report(
        &self,
        prober: &HttpProber,
        label: &str,
        result: &CanonicalResult,
    ) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        self.report_quiet(prober, label, result).await
    }

    async fn report_quiet(
        &self,
        prober: &HttpProber,
        label: &str,
        result: &CanonicalResult,
    ) -> anyhow::Result<()> {
        if !self.json {
            for url in &result.ready_urls {
                println!("ready   {url}");
            }
            for url in &result.pending_urls {
                println!("pending {url}");
            }
            if result.has_pending() {
                println!("Run `adsnap check <urls>` to check pending results again.");
            }
            if result.ready_urls.is_empty() && !result.has_pending() {
                println!("No results. Raw response:\n{}", result.raw);
            }
        }

        let Some(dir) = &self.save else {
            return Ok(());
        };
        std::fs::create_dir_all(dir)?;
        for (i, url) in result.ready_urls.iter().enumerate() {
            let data = prober.download(url).await?;
            let path = dir.join(file_name(label, i, url));
            std::fs::write(&path, &data)?;
            if !self.json {
                println!("saved   {} ({} bytes)", path.display(), data.len());
            }
        }
        Ok(())
    }
}

fn file_name(label: &str, index: usize, url: &str) -> String {
    let ext = url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "webp"))
        .unwrap_or_else(|| "png".into());
    format!("{label}_{}.{ext}", index + 1)
}
