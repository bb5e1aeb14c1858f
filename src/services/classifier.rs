use lazy_static::lazy_static;
use std::collections::HashSet;

use crate::config::Config;
use crate::models::{ContentItem, NormalizedMetadata};

lazy_static! {
    /// IMDb ids known a priori to be unwanted, with their canonical titles.
    /// Titles also feed the keyword fallback list.
    static ref BUILTIN_BLACKLIST: Vec<(&'static str, &'static str)> = vec![
        ("tt10850932", "crash landing on you"),
        ("tt5182866", "descendants of the sun"),
        ("tt1396277", "boys over flowers"),
        ("tt8242904", "touch your heart"),
        ("tt8120346", "meteor garden"),
        ("tt0248126", "kabhi khushi kabhie gham"),
    ];
}

/// Country aliases that trigger the unconditional China/India block.
/// Matched as whole tokens; `contains` checks below handle compound
/// names like "Republic of China".
const CN_IN_ALIASES: [&str; 8] = [
    "cn", "china", "tw", "taiwan", "hk", "hong kong", "in", "india",
];

const KOREAN_ALIASES: [&str; 3] = ["kr", "kor", "korea"];

/// Classification outcome for a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Block(BlockReason),
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Block(_))
    }

    /// Reason tag for logging ("none" for allowed items)
    pub fn reason(&self) -> &'static str {
        match self {
            Verdict::Allow => "none",
            Verdict::Block(reason) => reason.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Blacklist,
    RegionCnIn,
    KoreanDrama,
    KeywordMatch,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::Blacklist => "blacklist",
            BlockReason::RegionCnIn => "region-cn-in",
            BlockReason::KoreanDrama => "korean-drama",
            BlockReason::KeywordMatch => "keyword-match",
        }
    }
}

/// Every list and threshold the decision procedure consults.
/// Product policy lives here, not inline in the engine.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    /// Whether the always-keep override (genre exemption for Korean
    /// content) is active at all
    pub always_keep_enabled: bool,
    pub always_keep_genres: HashSet<String>,
    pub hard_melodrama_genres: HashSet<String>,
    pub professional_genres: HashSet<String>,
    pub kdrama_subgenres: HashSet<String>,
    pub kdrama_subgenre_threshold: usize,
    pub professional_keywords: Vec<String>,
    pub blocked_keywords: Vec<String>,
    pub blacklist: HashSet<String>,
}

impl FilterPolicy {
    pub fn from_config(config: &Config) -> Self {
        let mut blacklist: HashSet<String> = BUILTIN_BLACKLIST
            .iter()
            .map(|(id, _)| id.to_string())
            .collect();
        blacklist.extend(config.extra_blacklist.iter().cloned());

        let mut blocked_keywords: Vec<String> = config
            .blocked_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .collect();
        // Canonical titles of blacklisted items double as keywords
        blocked_keywords.extend(BUILTIN_BLACKLIST.iter().map(|(_, title)| title.to_string()));

        Self {
            always_keep_enabled: config.always_keep_enabled,
            always_keep_genres: lower_set(&config.always_keep_genres),
            hard_melodrama_genres: lower_set(&config.hard_melodrama_genres),
            professional_genres: lower_set(&config.professional_genres),
            kdrama_subgenres: lower_set(&config.kdrama_subgenres),
            kdrama_subgenre_threshold: config.kdrama_subgenre_threshold,
            professional_keywords: config
                .professional_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            blocked_keywords,
            blacklist,
        }
    }
}

#[cfg(test)]
impl Default for FilterPolicy {
    /// Reference policy used by tests; mirrors the config defaults
    fn default() -> Self {
        let blocked_keywords = [
            "k-drama",
            "kdrama",
            "korean drama",
            "chinese drama",
            "cdrama",
            "bollywood",
            "tollywood",
            "indian movie",
        ]
        .iter()
        .map(|s| s.to_string())
        .chain(BUILTIN_BLACKLIST.iter().map(|(_, t)| t.to_string()))
        .collect();

        Self {
            always_keep_enabled: true,
            always_keep_genres: lower_set(&strings(&[
                "Thriller", "Horror", "Sci-Fi", "Action", "Crime",
            ])),
            hard_melodrama_genres: lower_set(&strings(&["Romance", "Melodrama", "Family"])),
            professional_genres: lower_set(&strings(&["Medical", "Legal", "Comedy"])),
            kdrama_subgenres: lower_set(&strings(&[
                "Romance", "Comedy", "Medical", "Legal", "Family", "Melodrama",
            ])),
            kdrama_subgenre_threshold: 2,
            professional_keywords: strings(&[
                "doctor",
                "hospital",
                "surgeon",
                "medical",
                "lawyer",
                "legal",
                "court",
                "judge",
                "prosecutor",
            ]),
            blocked_keywords,
            blacklist: BUILTIN_BLACKLIST
                .iter()
                .map(|(id, _)| id.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn lower_set(list: &[String]) -> HashSet<String> {
    list.iter().map(|s| s.to_lowercase()).collect()
}

/// Split a raw country string into lower-cased whole tokens.
///
/// Tokens are split on list separators only, so multi-word names stay
/// intact ("Hong Kong" is one token). Matching against aliases is exact
/// equality, never substring containment: "Ukraine" must not match "kr"
/// and "Spain" must not match "in".
pub fn country_tokens(raw: &str) -> Vec<String> {
    raw.split([',', '/', ';', '|'])
        .map(|part| {
            part.trim()
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|token| !token.is_empty())
        .collect()
}

fn is_cn_in_token(token: &str) -> bool {
    // Compound-name exception: "Republic of China", "British India"
    CN_IN_ALIASES.contains(&token) || token.contains("china") || token.contains("india")
}

fn is_korean_token(token: &str) -> bool {
    KOREAN_ALIASES.contains(&token) || token.contains("korea")
}

/// Rule engine deciding ALLOW/BLOCK per item. Pure and deterministic:
/// all I/O (enrichment) happens before classification.
pub struct Classifier {
    policy: FilterPolicy,
}

impl Classifier {
    pub fn new(policy: FilterPolicy) -> Self {
        Self { policy }
    }

    /// Decision order, first match wins:
    /// 1. static blacklist
    /// 2. China/Taiwan/Hong Kong/India region block (no genre exception)
    /// 3. Korean smart filter (sub-rules in `classify_korean`)
    /// 4. keyword fallback on name + description
    /// 5. allow
    pub fn classify(&self, item: &ContentItem, metadata: Option<&NormalizedMetadata>) -> Verdict {
        if let Some(id) = &item.id {
            if self.policy.blacklist.contains(id) {
                return Verdict::Block(BlockReason::Blacklist);
            }
        }

        let countries = self.effective_countries(item, metadata);

        if countries.iter().any(|t| is_cn_in_token(t)) {
            return Verdict::Block(BlockReason::RegionCnIn);
        }

        if countries.iter().any(|t| is_korean_token(t)) {
            return self.classify_korean(item, &self.effective_genres(item, metadata));
        }

        if self.matches_blocked_keyword(item) {
            return Verdict::Block(BlockReason::KeywordMatch);
        }

        Verdict::Allow
    }

    /// Korean sub-rules, first match wins:
    /// a. always-keep genre present (when enabled) -> allow
    /// b. hard melodrama genre -> block
    /// c. Drama + professional genre or professional keyword -> block
    /// d. Drama + threshold-many typical k-drama subgenres -> block
    /// e. any genre string containing "korean" -> block
    /// f. allow
    fn classify_korean(&self, item: &ContentItem, genres: &HashSet<String>) -> Verdict {
        let p = &self.policy;

        if p.always_keep_enabled && genres.iter().any(|g| p.always_keep_genres.contains(g)) {
            return Verdict::Allow;
        }

        if genres.iter().any(|g| p.hard_melodrama_genres.contains(g)) {
            return Verdict::Block(BlockReason::KoreanDrama);
        }

        if genres.contains("drama") {
            let professional_genre = genres.iter().any(|g| p.professional_genres.contains(g));
            let professional_keyword = {
                let text = item.search_text();
                p.professional_keywords.iter().any(|k| text.contains(k))
            };
            if professional_genre || professional_keyword {
                return Verdict::Block(BlockReason::KoreanDrama);
            }

            let subgenre_hits = genres
                .iter()
                .filter(|g| p.kdrama_subgenres.contains(*g))
                .count();
            if subgenre_hits >= p.kdrama_subgenre_threshold {
                return Verdict::Block(BlockReason::KoreanDrama);
            }
        }

        if genres.iter().any(|g| g.contains("korean")) {
            return Verdict::Block(BlockReason::KoreanDrama);
        }

        Verdict::Allow
    }

    fn matches_blocked_keyword(&self, item: &ContentItem) -> bool {
        let text = item.search_text();
        self.policy.blocked_keywords.iter().any(|k| text.contains(k))
    }

    /// Country tokens from enriched metadata when available, else from
    /// the item's own declared country field
    fn effective_countries(
        &self,
        item: &ContentItem,
        metadata: Option<&NormalizedMetadata>,
    ) -> Vec<String> {
        if let Some(meta) = metadata {
            if !meta.countries.is_empty() {
                return meta.countries.iter().cloned().collect();
            }
        }
        item.country
            .as_ref()
            .map(|c| c.values().iter().flat_map(|v| country_tokens(v)).collect())
            .unwrap_or_default()
    }

    fn effective_genres(
        &self,
        item: &ContentItem,
        metadata: Option<&NormalizedMetadata>,
    ) -> HashSet<String> {
        if let Some(meta) = metadata {
            if !meta.genres.is_empty() {
                return meta.genres.iter().map(|g| g.to_lowercase()).collect();
            }
        }
        item.genres.iter().map(|g| g.to_lowercase()).collect()
    }
}
