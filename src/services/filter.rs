//! Filter Orchestrator
//!
//! Ties enrichment and classification together for catalog batches and
//! single meta items. Enrichment fan-out is bounded and order-preserving;
//! a failed lookup for one item degrades that item to fallback
//! classification and never aborts the batch.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::{ContentItem, NormalizedMetadata};
use crate::services::classifier::{Classifier, Verdict};
use crate::services::enrichment::EnrichmentService;

pub struct FilterService {
    enrichment: Arc<EnrichmentService>,
    classifier: Classifier,
    concurrency: usize,
}

impl FilterService {
    pub fn new(
        enrichment: Arc<EnrichmentService>,
        classifier: Classifier,
        concurrency: usize,
    ) -> Self {
        Self {
            enrichment,
            classifier,
            concurrency: concurrency.max(1),
        }
    }

    /// Filter a catalog batch: enrich (bounded concurrency, order kept),
    /// classify, drop blocked entries. Survivors pass through verbatim.
    pub async fn filter_batch(&self, items: Vec<ContentItem>) -> Vec<ContentItem> {
        let total = items.len();

        let classified: Vec<(ContentItem, Verdict)> = stream::iter(items)
            .map(|item| self.classify_item(item))
            .buffered(self.concurrency)
            .collect()
            .await;

        let kept: Vec<ContentItem> = classified
            .into_iter()
            .filter_map(|(item, verdict)| match verdict {
                Verdict::Allow => {
                    debug!(name = %item.name, "item allowed");
                    Some(item)
                }
                Verdict::Block(reason) => {
                    info!(name = %item.name, reason = reason.as_str(), "item filtered out");
                    None
                }
            })
            .collect();

        debug!(total, kept = kept.len(), "catalog batch filtered");
        kept
    }

    /// Filter a single meta item. A blocked item presents as `None`
    /// ("not found" to the client), never as an error.
    pub async fn filter_one(&self, item: ContentItem) -> Option<ContentItem> {
        let (item, verdict) = self.classify_item(item).await;
        match verdict {
            Verdict::Allow => {
                info!(name = %item.name, "item allowed");
                Some(item)
            }
            Verdict::Block(reason) => {
                info!(name = %item.name, reason = reason.as_str(), "item filtered out");
                None
            }
        }
    }

    async fn classify_item(&self, item: ContentItem) -> (ContentItem, Verdict) {
        let metadata = self.enrich(&item).await;
        let verdict = self.classifier.classify(&item, metadata.as_ref());
        (item, verdict)
    }

    async fn enrich(&self, item: &ContentItem) -> Option<NormalizedMetadata> {
        self.enrichment
            .enrich(item.id.as_deref(), &item.name, item.kind)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CountryField, MediaKind};
    use crate::services::cache::MetadataCache;
    use crate::services::classifier::FilterPolicy;
    use std::time::Duration;

    /// Orchestrator with no providers configured: classification runs
    /// on the raw item fields only
    fn filter_service() -> FilterService {
        let enrichment = Arc::new(EnrichmentService::new(
            vec![],
            MetadataCache::new(Duration::from_secs(60)),
        ));
        FilterService::new(enrichment, Classifier::new(FilterPolicy::default()), 4)
    }

    fn item(name: &str, country: Option<&str>, genres: &[&str]) -> ContentItem {
        ContentItem {
            id: None,
            name: name.to_string(),
            description: None,
            country: country.map(|c| CountryField::One(c.to_string())),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            kind: MediaKind::Series,
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_drops_blocked() {
        let service = filter_service();
        let items = vec![
            item("A", Some("United States"), &["Drama"]),
            item("B", Some("China"), &[]),
            item("C", Some("Japan"), &["Action"]),
            item("D", Some("India"), &[]),
            item("E", None, &[]),
        ];

        let filtered = service.filter_batch(items).await;
        let names: Vec<&str> = filtered.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "E"]);
    }

    #[tokio::test]
    async fn test_batch_filtering_is_idempotent() {
        let service = filter_service();
        let items = vec![
            item("A", Some("United States"), &[]),
            item("B", Some("South Korea"), &["Drama", "Romance"]),
            item("C", Some("France"), &[]),
        ];

        let once = service.filter_batch(items).await;
        let twice = service.filter_batch(once.clone()).await;
        let once_names: Vec<&str> = once.iter().map(|i| i.name.as_str()).collect();
        let twice_names: Vec<&str> = twice.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(once_names, twice_names);
    }

    #[tokio::test]
    async fn test_surviving_items_not_mutated() {
        let service = filter_service();
        let mut original = item("A", Some("United States"), &["Drama"]);
        original
            .extra
            .insert("poster".to_string(), "http://p/a.jpg".into());

        let filtered = service.filter_batch(vec![original.clone()]).await;
        assert_eq!(filtered.len(), 1);
        assert_eq!(
            serde_json::to_value(&filtered[0]).unwrap(),
            serde_json::to_value(&original).unwrap()
        );
    }

    #[tokio::test]
    async fn test_filter_one_blocked_returns_none() {
        let service = filter_service();
        let blocked = item("Some Show", Some("China"), &[]);
        assert!(service.filter_one(blocked).await.is_none());
    }

    #[tokio::test]
    async fn test_filter_one_allowed_passes_through() {
        let service = filter_service();
        let allowed = item("Some Show", Some("United States"), &["Drama"]);
        let result = service.filter_one(allowed).await.unwrap();
        assert_eq!(result.name, "Some Show");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let service = filter_service();
        assert!(service.filter_batch(vec![]).await.is_empty());
    }
}
