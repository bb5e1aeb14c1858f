//! TMDB provider
//!
//! General-purpose movie/series metadata from the TMDB v3 API. Lookup by
//! IMDb id goes through `/find/{id}?external_source=imdb_id`; title
//! lookup through `/search/{movie|tv}` taking the top (most popular)
//! result. Both resolve to a details fetch that carries the genre and
//! production-country fields we normalize.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

use super::{EnrichError, MetadataSource};
use crate::models::{MediaKind, NormalizedMetadata};
use crate::services::classifier::country_tokens;

pub struct TmdbClient {
    http: Client,
    base_url: String,
    api_key: String,
}

// ============ Wire Types ============

#[derive(Debug, Default, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<SearchHit>,
    #[serde(default)]
    tv_results: Vec<SearchHit>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProductionCountry {
    #[serde(rename = "iso_3166_1")]
    iso: String,
}

#[derive(Debug, Default, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    production_countries: Vec<ProductionCountry>,
    /// Present on tv details only
    #[serde(default)]
    origin_country: Vec<String>,
}

impl TmdbClient {
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
        }
    }

    /// Make a GET request, appending the api key query parameter
    async fn get<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, EnrichError> {
        let sep = if path_and_query.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{}{}api_key={}",
            self.base_url, path_and_query, sep, self.api_key
        );

        let response = self
            .http
            .get(&url)
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

    fn media_path(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Series => "tv",
            _ => "movie",
        }
    }

    async fn fetch_details(
        &self,
        kind: MediaKind,
        id: i64,
    ) -> Result<Option<NormalizedMetadata>, EnrichError> {
        let details: DetailsResponse = self
            .get(&format!("/{}/{}", Self::media_path(kind), id))
            .await?;
        Ok(normalize(details))
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn prefers(&self, kind: MediaKind) -> bool {
        !matches!(kind, MediaKind::Series)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<NormalizedMetadata>, EnrichError> {
        let found: FindResponse = self
            .get(&format!(
                "/find/{}?external_source=imdb_id",
                urlencoding::encode(external_id)
            ))
            .await?;

        // Prefer the result list matching the requested kind, but take
        // whatever matched: upstream kind declarations are unreliable
        let (preferred, other) = match kind {
            MediaKind::Series => (found.tv_results, found.movie_results),
            _ => (found.movie_results, found.tv_results),
        };

        if let Some(hit) = preferred.first() {
            debug!(external_id, tmdb_id = hit.id, "tmdb find hit");
            return self.fetch_details(kind, hit.id).await;
        }
        if let Some(hit) = other.first() {
            let flipped = match kind {
                MediaKind::Series => MediaKind::Movie,
                _ => MediaKind::Series,
            };
            debug!(external_id, tmdb_id = hit.id, "tmdb find hit (other kind)");
            return self.fetch_details(flipped, hit.id).await;
        }

        Ok(None)
    }

    async fn search_by_title(
        &self,
        title: &str,
        kind: MediaKind,
    ) -> Result<Option<NormalizedMetadata>, EnrichError> {
        let found: SearchResponse = self
            .get(&format!(
                "/search/{}?query={}",
                Self::media_path(kind),
                urlencoding::encode(title)
            ))
            .await?;

        match found.results.first() {
            Some(hit) => {
                debug!(title, tmdb_id = hit.id, "tmdb search hit");
                self.fetch_details(kind, hit.id).await
            }
            None => Ok(None),
        }
    }
}

/// Collapse the TMDB details shape into canonical country tokens and
/// genre names; an all-empty record reads as absent
fn normalize(details: DetailsResponse) -> Option<NormalizedMetadata> {
    let mut countries: BTreeSet<String> = BTreeSet::new();
    for pc in &details.production_countries {
        countries.extend(country_tokens(&pc.iso));
    }
    for oc in &details.origin_country {
        countries.extend(country_tokens(oc));
    }

    let genres: BTreeSet<String> = details.genres.into_iter().map(|g| g.name).collect();

    let meta = NormalizedMetadata { countries, genres };
    if meta.is_empty() {
        None
    } else {
        Some(meta)
    }
}
