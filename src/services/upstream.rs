//! Upstream addon client
//!
//! Fetches catalog/meta/stream payloads from the wrapped addon. Every
//! failure mode (timeout, non-2xx, malformed JSON) degrades to an empty
//! result with a warning log; the filter layer never sees an error.

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::models::{CatalogResponse, ContentItem, MetaResponse};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {0}")]
    Http(u16),
    #[error("parse error: {0}")]
    Parse(String),
}

pub struct AddonClient {
    http: Client,
    base_url: String,
}

impl AddonClient {
    pub fn new(base_url: &str, timeout_ms: u64, user_agent: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(user_agent)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `GET {base}/catalog/{type}/{id}[/{extra}].json` -> metas,
    /// or an empty list on any failure
    pub async fn get_catalog(&self, kind: &str, id: &str, extra: Option<&str>) -> Vec<ContentItem> {
        let path = match extra {
            Some(extra) => format!("/catalog/{}/{}/{}.json", kind, id, extra),
            None => format!("/catalog/{}/{}.json", kind, id),
        };

        match self.get_json::<CatalogResponse>(&path).await {
            Ok(response) => response.metas,
            Err(e) => {
                warn!(path = %path, error = %e, "upstream catalog fetch failed");
                Vec::new()
            }
        }
    }

    /// `GET {base}/meta/{type}/{id}.json` -> meta, or `None` on failure
    pub async fn get_meta(&self, kind: &str, id: &str) -> Option<ContentItem> {
        let path = format!("/meta/{}/{}.json", kind, id);

        match self.get_json::<MetaResponse>(&path).await {
            Ok(response) => response.meta,
            Err(e) => {
                warn!(path = %path, error = %e, "upstream meta fetch failed");
                None
            }
        }
    }

    /// `GET {base}/stream/{type}/{id}.json` passed through untouched;
    /// failures read as an empty stream list
    pub async fn get_streams(&self, kind: &str, id: &str) -> serde_json::Value {
        let path = format!("/stream/{}/{}.json", kind, id);

        match self.get_json::<serde_json::Value>(&path).await {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path, error = %e, "upstream stream fetch failed");
                serde_json::json!({ "streams": [] })
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Http(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))
    }
}
