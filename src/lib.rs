#![warn(missing_docs)]
//! AdSnap - product ad studio client for the Bria image API.
//!
//! Submit product-image operations (packshots, shadows, lifestyle shots,
//! generative fill, foreground erasure, HD text-to-image), normalize the
//! heterogeneous responses into ready and pending URLs, and poll pending
//! results until they exist.
//!
//! # Quick Start
//!
//! ```no_run
//! use adsnap::{HdGenerateRequest, StudioClient, StudioSession};
//!
//! #[tokio::main]
//! async fn main() -> adsnap::Result<()> {
//!     let client = StudioClient::builder().build()?;
//!     let mut session = StudioSession::new(client);
//!
//!     let request = HdGenerateRequest::new("A ceramic mug on a walnut desk")
//!         .with_num_results(2)
//!         .with_sync(false);
//!     let result = session.execute(&request.into()).await?;
//!     println!("ready: {:?}", result.ready_urls);
//!
//!     // Anything not ready after the automatic rounds can be rechecked.
//!     let more = session.recheck().await;
//!     println!("now ready: {:?}", more);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `filters`: local basic filters (grayscale, sepia, high contrast, blur)
//! - `cli`: the `adsnap` command-line interface

mod error;

pub mod client;
pub mod normalize;
pub mod operations;
pub mod poll;
pub mod session;
pub mod workflow;

#[cfg(feature = "filters")]
pub mod filters;

// Re-export error types at crate root
pub use error::{Result, StudioError};

pub use client::{HttpProber, StudioClient, StudioClientBuilder};
pub use normalize::{CanonicalResult, NormalizeContext, Normalizer, ShapeRule};
pub use operations::{
    AspectRatio, EraseForegroundRequest, GenFillRequest, HdGenerateRequest, ImagePayload,
    LifestyleImageRequest, LifestyleTextRequest, ManualPlacement, MaskType, Medium,
    OperationKind, OperationRequest, PackshotRequest, PlacementSettings, PlacementType,
    PromptEnhanceRequest, ShadowRequest, ShadowType,
};
pub use poll::{PollState, Poller, UrlProber};
pub use session::StudioSession;
pub use workflow::{generate_ad_set, AdSet, AdSetConfig};

#[cfg(feature = "filters")]
pub use filters::{apply_filter, encode_png, BasicFilter};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::StudioClient;
    pub use crate::error::{Result, StudioError};
    pub use crate::normalize::CanonicalResult;
    pub use crate::operations::{ImagePayload, OperationRequest};
    pub use crate::poll::UrlProber;
    pub use crate::session::StudioSession;
}
