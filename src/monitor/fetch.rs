//! Pull the OI payload straight from a JSON endpoint.

use std::time::Duration;

use reqwest::Client;

use crate::error::{CadenceError, Result};

/// GET `url` and return the body. Gives up after `timeout`.
pub async fn fetch_payload(url: &str, timeout: Duration) -> Result<String> {
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CadenceError::Payload(format!("Failed to create HTTP client: {}", e)))?;

    log::info!("Fetching payload from {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CadenceError::Payload(format!("Request to {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CadenceError::Payload(format!("{} returned {}", url, status)));
    }

    response
        .text()
        .await
        .map_err(|e| CadenceError::Payload(format!("Failed to read body from {}: {}", url, e)))
}
