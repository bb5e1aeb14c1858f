use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Media type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
    #[serde(other)]
    Unknown,
}

impl Default for MediaKind {
    fn default() -> Self {
        Self::Unknown
    }
}

impl MediaKind {
    fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Series => write!(f, "series"),
            MediaKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Country field as delivered by upstream providers.
/// Some send a single string ("South Korea, Japan"), others a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountryField {
    One(String),
    Many(Vec<String>),
}

impl CountryField {
    /// Raw country strings, regardless of upstream shape
    pub fn values(&self) -> Vec<&str> {
        match self {
            CountryField::One(s) => vec![s.as_str()],
            CountryField::Many(list) => list.iter().map(|s| s.as_str()).collect(),
        }
    }
}

/// Single catalog/meta entry from the upstream addon.
///
/// Only the fields the filter inspects are typed; everything else is kept
/// in `extra` and serialized back verbatim. Items are never mutated, only
/// dropped or passed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<CountryField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(rename = "type", default, skip_serializing_if = "MediaKind::is_unknown")]
    pub kind: MediaKind,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ContentItem {
    /// Lower-cased name + description, used for keyword matching
    pub fn search_text(&self) -> String {
        let mut text = self.name.to_lowercase();
        if let Some(desc) = &self.description {
            text.push(' ');
            text.push_str(&desc.to_lowercase());
        }
        text
    }
}

/// Canonical country/genre metadata consumed by the classifier,
/// independent of which provider (or raw item field) produced it.
///
/// Country entries are lower-cased whole tokens; genre entries keep their
/// upstream casing and are lower-cased at comparison time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedMetadata {
    pub countries: BTreeSet<String>,
    pub genres: BTreeSet<String>,
}

impl NormalizedMetadata {
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty() && self.genres.is_empty()
    }
}

/// Upstream catalog payload: `{ "metas": [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub metas: Vec<ContentItem>,
}

/// Upstream meta payload: `{ "meta": {...} | null }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaResponse {
    pub meta: Option<ContentItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_single_string() {
        let item: ContentItem =
            serde_json::from_str(r#"{"name":"Test","country":"South Korea"}"#).unwrap();
        let country = item.country.unwrap();
        assert_eq!(country.values(), vec!["South Korea"]);
    }

    #[test]
    fn test_country_list() {
        let item: ContentItem =
            serde_json::from_str(r#"{"name":"Test","country":["Japan","France"]}"#).unwrap();
        let country = item.country.unwrap();
        assert_eq!(country.values(), vec!["Japan", "France"]);
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let raw = r#"{"id":"tt123","name":"Test","type":"movie","poster":"http://p/x.jpg","runtime":"120 min"}"#;
        let item: ContentItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.extra.get("poster").unwrap(), "http://p/x.jpg");

        let out = serde_json::to_value(&item).unwrap();
        assert_eq!(out["poster"], "http://p/x.jpg");
        assert_eq!(out["runtime"], "120 min");
        assert_eq!(out["type"], "movie");
    }

    #[test]
    fn test_unknown_media_kind_tolerated() {
        let item: ContentItem =
            serde_json::from_str(r#"{"name":"Test","type":"channel"}"#).unwrap();
        assert_eq!(item.kind, MediaKind::Unknown);
    }

    #[test]
    fn test_search_text_lowercases() {
        let item = ContentItem {
            id: None,
            name: "Hospital Playlist".to_string(),
            description: Some("A Medical K-Drama".to_string()),
            country: None,
            genres: vec![],
            kind: MediaKind::Series,
            extra: Default::default(),
        };
        assert_eq!(item.search_text(), "hospital playlist a medical k-drama");
    }
}
