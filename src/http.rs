//! Shared HTTP plumbing for provider adapters
//!
//! One client is built per run and handed to every provider. Response
//! handling is split so that transport failures, non-2xx statuses and body
//! decode failures surface as distinct [`ProvisionError`] kinds.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ProvisionError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the client shared by all providers
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Join percent-encoded path segments onto an API base URL
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ProvisionError> {
    let mut url = Url::parse(base)
        .map_err(|e| ProvisionError::transport(format!("invalid API base '{}': {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| ProvisionError::transport(format!("API base '{}' cannot be a base", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Pass 2xx responses through; turn anything else into a rejection carrying the body
pub async fn ensure_success(response: Response) -> Result<Response, ProvisionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.ok();
    Err(ProvisionError::http_status(status.as_u16(), body))
}

/// Read the full body, then parse it as JSON
///
/// Reading is a transport concern and parsing a decode concern, so the two
/// fail with different kinds.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProvisionError> {
    let body = response
        .text()
        .await
        .map_err(|e| ProvisionError::transport(format!("failed to read response body: {}", e)))?;
    serde_json::from_str(&body).map_err(|e| ProvisionError::decode(e.to_string()))
}
