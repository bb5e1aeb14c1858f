//! Metadata Enrichment
//!
//! Resolves thin catalog items (IMDb-style id and/or title) to canonical
//! country/genre metadata via third-party providers:
//!
//! - **TheTVDB** (series-oriented): login-token auth, title/imdb search
//! - **TMDB** (general-purpose): api-key auth, find-by-external-id
//!
//! Providers are consulted in priority order (series-oriented first for
//! series), first non-absent result wins and is cached. Every provider
//! failure is recovered to an absent result; the classifier then falls
//! back to the item's own declared fields.

pub mod tmdb;
pub mod tvdb;

pub use tmdb::TmdbClient;
pub use tvdb::TvdbClient;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{MediaKind, NormalizedMetadata};
use crate::services::cache::MetadataCache;

/// Provider error taxonomy. None of these are fatal to a request: the
/// enrichment service recovers all of them to an absent result.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {0}")]
    Http(u16),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("token refresh failed: {0}")]
    TokenRefresh(String),
}

/// A single upstream info provider
#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// True when this provider specializes in the given media kind and
    /// should be queried before general-purpose ones
    fn prefers(&self, kind: MediaKind) -> bool;

    async fn find_by_external_id(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<NormalizedMetadata>, EnrichError>;

    async fn search_by_title(
        &self,
        title: &str,
        kind: MediaKind,
    ) -> Result<Option<NormalizedMetadata>, EnrichError>;
}

/// Cache-fronted lookup across all configured providers
pub struct EnrichmentService {
    sources: Vec<Arc<dyn MetadataSource>>,
    cache: MetadataCache,
}

impl EnrichmentService {
    pub fn new(sources: Vec<Arc<dyn MetadataSource>>, cache: MetadataCache) -> Self {
        Self { sources, cache }
    }

    /// Resolve an item to normalized metadata, or `None` when every
    /// provider comes up empty. The caller falls back to the raw item
    /// fields in that case.
    pub async fn enrich(
        &self,
        external_id: Option<&str>,
        title: &str,
        kind: MediaKind,
    ) -> Option<NormalizedMetadata> {
        let key = external_id.unwrap_or(title);
        if key.is_empty() {
            return None;
        }

        if let Some(hit) = self.cache.get(key).await {
            debug!(key, "enrichment cache hit");
            return Some(hit);
        }

        // Stable sort: preferred providers first, configured order kept
        // within each class
        let mut ordered: Vec<&Arc<dyn MetadataSource>> = self.sources.iter().collect();
        ordered.sort_by_key(|s| !s.prefers(kind));

        for source in ordered {
            if let Some(meta) = self.lookup(source.as_ref(), external_id, title, kind).await {
                self.cache.put(key, meta.clone()).await;
                return Some(meta);
            }
        }

        None
    }

    /// Number of cached enrichment entries (for the health endpoint)
    pub async fn cache_entries(&self) -> usize {
        self.cache.len().await
    }

    /// Id lookup first, then title search on the same provider.
    /// Errors degrade to an absent result, never propagate.
    async fn lookup(
        &self,
        source: &dyn MetadataSource,
        external_id: Option<&str>,
        title: &str,
        kind: MediaKind,
    ) -> Option<NormalizedMetadata> {
        if let Some(id) = external_id {
            match source.find_by_external_id(id, kind).await {
                Ok(Some(meta)) if !meta.is_empty() => return Some(meta),
                Ok(_) => {}
                Err(e) => {
                    warn!(provider = source.name(), external_id = id, error = %e, "id lookup failed");
                }
            }
        }

        if title.is_empty() {
            return None;
        }

        match source.search_by_title(title, kind).await {
            Ok(Some(meta)) if !meta.is_empty() => Some(meta),
            Ok(_) => None,
            Err(e) => {
                warn!(provider = source.name(), title, error = %e, "title search failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted provider counting how often it is queried
    struct FakeSource {
        name: &'static str,
        preferred_kind: MediaKind,
        result: Option<NormalizedMetadata>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn returning(name: &'static str, result: Option<NormalizedMetadata>) -> Self {
            Self {
                name,
                preferred_kind: MediaKind::Movie,
                result,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                name,
                preferred_kind: MediaKind::Movie,
                result: None,
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetadataSource for FakeSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn prefers(&self, kind: MediaKind) -> bool {
            kind == self.preferred_kind
        }

        async fn find_by_external_id(
            &self,
            _external_id: &str,
            _kind: MediaKind,
        ) -> Result<Option<NormalizedMetadata>, EnrichError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EnrichError::Http(503));
            }
            Ok(self.result.clone())
        }

        async fn search_by_title(
            &self,
            _title: &str,
            _kind: MediaKind,
        ) -> Result<Option<NormalizedMetadata>, EnrichError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EnrichError::Network("timeout".to_string()));
            }
            Ok(self.result.clone())
        }
    }

    fn korean_meta() -> NormalizedMetadata {
        NormalizedMetadata {
            countries: ["kr".to_string()].into_iter().collect(),
            genres: ["Drama".to_string()].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn test_cached_result_skips_provider() {
        let source = Arc::new(FakeSource::returning("fake", Some(korean_meta())));
        let service = EnrichmentService::new(
            vec![source.clone()],
            MetadataCache::new(Duration::from_secs(60)),
        );

        let first = service
            .enrich(Some("tt123"), "Some Show", MediaKind::Series)
            .await
            .unwrap();
        let second = service
            .enrich(Some("tt123"), "Some Show", MediaKind::Series)
            .await
            .unwrap();

        assert_eq!(first, second);
        // One id lookup for the first call, nothing for the second
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_cache_triggers_fresh_lookup() {
        let source = Arc::new(FakeSource::returning("fake", Some(korean_meta())));
        let service =
            EnrichmentService::new(vec![source.clone()], MetadataCache::new(Duration::ZERO));

        service
            .enrich(Some("tt123"), "Some Show", MediaKind::Series)
            .await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        service
            .enrich(Some("tt123"), "Some Show", MediaKind::Series)
            .await;

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_absent() {
        let broken = Arc::new(FakeSource::failing("broken"));
        let service = EnrichmentService::new(
            vec![broken.clone()],
            MetadataCache::new(Duration::from_secs(60)),
        );

        let result = service
            .enrich(Some("tt123"), "Some Show", MediaKind::Movie)
            .await;
        assert!(result.is_none());
        // Both the id lookup and the title fallback were attempted
        assert_eq!(broken.calls(), 2);
    }

    #[tokio::test]
    async fn test_second_provider_wins_after_first_fails() {
        let broken = Arc::new(FakeSource::failing("broken"));
        let working = Arc::new(FakeSource::returning("working", Some(korean_meta())));
        let service = EnrichmentService::new(
            vec![broken.clone(), working.clone()],
            MetadataCache::new(Duration::from_secs(60)),
        );

        let result = service
            .enrich(Some("tt123"), "Some Show", MediaKind::Movie)
            .await;
        assert!(result.is_some());
        assert!(working.calls() >= 1);
    }

    #[tokio::test]
    async fn test_preferred_provider_queried_first() {
        let mut series_source = FakeSource::returning("series-first", Some(korean_meta()));
        series_source.preferred_kind = MediaKind::Series;
        let series_source = Arc::new(series_source);
        let general = Arc::new(FakeSource::returning("general", Some(korean_meta())));

        // Configured order puts the general provider first; preference
        // for series must reorder it behind the series provider
        let service = EnrichmentService::new(
            vec![general.clone(), series_source.clone()],
            MetadataCache::new(Duration::from_secs(60)),
        );

        service
            .enrich(Some("tt123"), "Some Show", MediaKind::Series)
            .await;
        assert_eq!(series_source.calls(), 1);
        assert_eq!(general.calls(), 0);
    }

    #[tokio::test]
    async fn test_title_used_as_key_when_no_id() {
        let source = Arc::new(FakeSource::returning("fake", Some(korean_meta())));
        let service = EnrichmentService::new(
            vec![source.clone()],
            MetadataCache::new(Duration::from_secs(60)),
        );

        service.enrich(None, "Some Show", MediaKind::Movie).await;
        service.enrich(None, "Some Show", MediaKind::Movie).await;
        // Second call served from cache under the title key
        assert_eq!(source.calls(), 1);
    }
}
