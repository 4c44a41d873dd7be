//! Content Sources
//!
//! Where read-through misses get their data. The gateway only needs a JSON
//! document per resource listing; the shape of that document is the
//! backend's business.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::keys::Resource;

/// Produces fresh content for a resource listing.
#[async_trait]
pub trait FetchSource: Send + Sync {
    /// Fetch the listing for `resource` filtered by `query`.
    async fn fetch(&self, resource: Resource, query: &BTreeMap<String, String>) -> Result<Value>;
}

// == HTTP Source ==
/// Fetches listings from the site backend at `{base_url}/api/{resource}`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl FetchSource for HttpSource {
    async fn fetch(&self, resource: Resource, query: &BTreeMap<String, String>) -> Result<Value> {
        let url = format!("{}/api/{}", self.base_url, resource);
        debug!(%url, ?query, "fetching upstream content");

        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CacheError::Upstream(format!(
                "{} returned {}: {}",
                url, status, body
            )));
        }

        Ok(response.json::<Value>().await?)
    }
}
