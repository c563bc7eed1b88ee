//! HD generation example - enhances a prompt, generates an image and saves it.
//!
//! Run with: `cargo run --example generate_hd -- "<prompt>"`
//!
//! Requires `BRIA_API_KEY` environment variable.

use adsnap::{AspectRatio, HdGenerateRequest, StudioClient};

#[tokio::main]
async fn main() -> adsnap::Result<()> {
    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "A glass perfume bottle on wet black stone".to_string());

    let client = StudioClient::builder().build()?;

    let prompt = client.enhance_prompt(&prompt).await;
    println!("Prompt: {}", prompt);

    let request = HdGenerateRequest::new(prompt).with_aspect_ratio(AspectRatio::FourFive);
    let result = client.run(&request.into()).await?.into_recognized()?;

    if let Some(url) = result.first_ready() {
        let bytes = client.download(url).await?;
        std::fs::write("generated.png", &bytes)?;
        println!("Image saved to generated.png ({} bytes)", bytes.len());
    }

    Ok(())
}
