//! HTTP downloads for template listings and template images.

use image::DynamicImage;
use std::time::Duration;

use crate::error::MememeError;
use crate::template::Template;

/// Build the HTTP client used for catalog refreshes and image fetches.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client, MememeError> {
    reqwest::Client::builder()
        .user_agent(concat!("mememe/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| MememeError::ResourceLoad(format!("HTTP client error: {}", e)))
}

/// Download a URL, failing on non-success status codes.
pub async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, MememeError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MememeError::ResourceLoad(format!("Failed to download {}: {}", url, e)))?;
    if !response.status().is_success() {
        return Err(MememeError::ResourceLoad(format!(
            "Failed to download {}: HTTP {}",
            url,
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| MememeError::ResourceLoad(format!("Failed to read {}: {}", url, e)))?;
    Ok(bytes.to_vec())
}

/// Download and decode an image.
pub async fn fetch_image(client: &reqwest::Client, url: &str) -> Result<DynamicImage, MememeError> {
    let bytes = fetch_bytes(client, url).await?;
    decode_image(&bytes)
}

/// Download a template's thumbnail image.
pub async fn fetch_template_image(
    client: &reqwest::Client,
    template: &Template,
) -> Result<DynamicImage, MememeError> {
    tracing::debug!(id = %template.id, url = %template.thumb_url, "fetching template image");
    fetch_image(client, &template.thumb_url).await
}

/// Decode image bytes of any format the `image` crate understands.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, MememeError> {
    image::load_from_memory(bytes)
        .map_err(|e| MememeError::ResourceLoad(format!("Failed to decode image: {}", e)))
}
