//! HTTP client for the external song metadata service.

use super::{LookupError, MetadataLookup, SongDetail};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub struct MetadataLookupClient {
    client: reqwest::Client,
    base_url: String,
}

impl MetadataLookupClient {
    /// Create a new lookup client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the metadata service (e.g., "http://localhost:8081")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl MetadataLookup for MetadataLookupClient {
    async fn lookup(&self, group: &str, title: &str) -> Result<SongDetail, LookupError> {
        let url = format!("{}/info", self.base_url);
        debug!("Looking up \"{}\" by \"{}\"", title, group);

        let response = self
            .client
            .get(&url)
            .query(&[("group", group), ("song", title)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Metadata lookup for \"{}\" failed: {}", title, status);
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| LookupError::InvalidResponse(err.to_string()))
    }
}
