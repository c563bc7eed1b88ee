//! Lifestyle shot example - places a product photo in a described scene.
//!
//! Run with: `cargo run --example lifestyle_shot -- <product.png> "<scene>"`
//!
//! Requires `BRIA_API_KEY` environment variable.

use adsnap::{LifestyleTextRequest, PlacementSettings, StudioClient, StudioSession};

#[tokio::main]
async fn main() -> adsnap::Result<()> {
    let mut args = std::env::args().skip(1);
    let input_path = args.next().ok_or_else(|| {
        adsnap::StudioError::InvalidRequest("usage: lifestyle_shot <product.png> [scene]".into())
    })?;
    let scene = args
        .next()
        .unwrap_or_else(|| "on a marble kitchen counter, morning light".to_string());

    let product = std::fs::read(&input_path)?;

    let client = StudioClient::builder().build()?;
    let mut session = StudioSession::new(client);

    let request = LifestyleTextRequest::new(product, scene)
        .with_placement(PlacementSettings::automatic([1000, 1000]))
        .with_num_results(2);

    let result = session.execute(&request.into()).await?;
    for url in &result.ready_urls {
        println!("ready: {}", url);
    }

    // One manual recheck; anything still pending is left to the user.
    for url in session.recheck().await {
        println!("ready: {}", url);
    }
    let pending = session.pending_urls();
    if !pending.is_empty() {
        println!(
            "{} still pending, check later with: adsnap check {}",
            pending.len(),
            pending.join(" ")
        );
    }

    Ok(())
}
