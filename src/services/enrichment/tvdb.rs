//! TheTVDB provider
//!
//! Series-oriented metadata. Auth is a login call exchanging the API key
//! for a short-lived JWT; the token is held in-process and refreshed
//! lazily shortly before its 24h expiry. Lookup goes through
//! `/search/series` (by imdb id or by name), then `/series/{id}` for the
//! genre/country detail record.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::{EnrichError, MetadataSource};
use crate::models::{MediaKind, NormalizedMetadata};
use crate::services::classifier::country_tokens;

/// Tokens are valid for 24h; refresh a bit early
const TOKEN_VALIDITY: Duration = Duration::from_secs(23 * 60 * 60);

pub struct TvdbClient {
    http: Client,
    base_url: String,
    api_key: String,
    token: RwLock<Option<BearerToken>>,
}

#[derive(Clone)]
struct BearerToken {
    value: String,
    obtained_at: Instant,
}

// ============ Wire Types ============

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    data: SeriesData,
}

#[derive(Debug, Default, Deserialize)]
struct SeriesData {
    #[serde(default)]
    genre: Vec<String>,
    #[serde(default)]
    country: Option<String>,
}

impl TvdbClient {
    pub fn new(base_url: &str, api_key: &str, timeout_ms: u64, user_agent: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(user_agent)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            token: RwLock::new(None),
        }
    }

    /// Current bearer token, logging in again when the held one is
    /// missing or near expiry
    async fn bearer_token(&self) -> Result<String, EnrichError> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref() {
                if token.obtained_at.elapsed() < TOKEN_VALIDITY {
                    return Ok(token.value.clone());
                }
            }
        }

        let fresh = self.login().await?;
        let mut guard = self.token.write().await;
        *guard = Some(BearerToken {
            value: fresh.clone(),
            obtained_at: Instant::now(),
        });
        Ok(fresh)
    }

    async fn login(&self) -> Result<String, EnrichError> {
        debug!("refreshing tvdb token");
        let response = self
            .http
            .post(format!("{}/login", self.base_url))
            .json(&serde_json::json!({ "apikey": self.api_key }))
            .send()
            .await
            .map_err(|e| EnrichError::TokenRefresh(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::TokenRefresh(format!("status {}", status.as_u16())));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::TokenRefresh(e.to_string()))?;
        Ok(login.token)
    }

    async fn get<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, EnrichError> {
        let token = self.bearer_token().await?;
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path_and_query))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| EnrichError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::Http(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| EnrichError::Parse(e.to_string()))
    }

    async fn fetch_details(&self, id: i64) -> Result<Option<NormalizedMetadata>, EnrichError> {
        let series: SeriesResponse = self.get(&format!("/series/{}", id)).await?;
        Ok(normalize(series.data))
    }

    async fn resolve_first_hit(
        &self,
        query: &str,
    ) -> Result<Option<NormalizedMetadata>, EnrichError> {
        let found: SearchResponse = match self.get(&format!("/search/series?{}", query)).await {
            Ok(found) => found,
            // TheTVDB answers 404 for "no matches"
            Err(EnrichError::Http(404)) => return Ok(None),
            Err(e) => return Err(e),
        };

        match found.data.first() {
            Some(hit) => {
                debug!(query, tvdb_id = hit.id, "tvdb search hit");
                self.fetch_details(hit.id).await
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MetadataSource for TvdbClient {
    fn name(&self) -> &'static str {
        "tvdb"
    }

    fn prefers(&self, kind: MediaKind) -> bool {
        matches!(kind, MediaKind::Series)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<NormalizedMetadata>, EnrichError> {
        // Series database only; let the general-purpose provider handle
        // movies
        if !matches!(kind, MediaKind::Series) {
            return Ok(None);
        }
        self.resolve_first_hit(&format!("imdbId={}", urlencoding::encode(external_id)))
            .await
    }

    async fn search_by_title(
        &self,
        title: &str,
        kind: MediaKind,
    ) -> Result<Option<NormalizedMetadata>, EnrichError> {
        if !matches!(kind, MediaKind::Series) {
            return Ok(None);
        }
        self.resolve_first_hit(&format!("name={}", urlencoding::encode(title)))
            .await
    }
}

fn normalize(data: SeriesData) -> Option<NormalizedMetadata> {
    let countries: BTreeSet<String> = data
        .country
        .as_deref()
        .map(|c| country_tokens(c).into_iter().collect())
        .unwrap_or_default();
    let genres: BTreeSet<String> = data.genre.into_iter().collect();

    let meta = NormalizedMetadata { countries, genres };
    if meta.is_empty() {
        None
    } else {
        Some(meta)
    }
}
