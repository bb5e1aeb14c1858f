use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub node_env: String,

    // Upstream addon
    pub upstream_url: String,
    pub upstream_timeout_ms: u64,

    // Enrichment providers
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    pub tvdb_api_key: Option<String>,
    pub tvdb_base_url: String,
    pub provider_timeout_ms: u64,

    // Enrichment cache
    pub cache_ttl_seconds: u64,

    // Batch filtering
    pub enrich_concurrency: usize,

    // Filter policy
    pub always_keep_enabled: bool,
    pub always_keep_genres: Vec<String>,
    pub hard_melodrama_genres: Vec<String>,
    pub professional_genres: Vec<String>,
    pub kdrama_subgenres: Vec<String>,
    pub kdrama_subgenre_threshold: usize,
    pub professional_keywords: Vec<String>,
    pub blocked_keywords: Vec<String>,
    pub extra_blacklist: Vec<String>,

    // Misc
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "7010".to_string())
                .parse()
                .unwrap_or(7010),
            node_env: env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string()),

            // Upstream addon (catalog/meta/stream provider)
            upstream_url: env::var("UPSTREAM_URL")
                .unwrap_or_else(|_| "http://localhost:7000".to_string()),
            upstream_timeout_ms: env::var("UPSTREAM_TIMEOUT_MS")
                .unwrap_or_else(|_| "15000".to_string())
                .parse()
                .unwrap_or(15_000), // 15 seconds

            // Enrichment providers
            tmdb_api_key: env::var("TMDB_API_KEY").ok().filter(|k| !k.is_empty()),
            tmdb_base_url: env::var("TMDB_BASE_URL")
                .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string()),
            tvdb_api_key: env::var("TVDB_API_KEY").ok().filter(|k| !k.is_empty()),
            tvdb_base_url: env::var("TVDB_BASE_URL")
                .unwrap_or_else(|_| "https://api.thetvdb.com".to_string()),
            provider_timeout_ms: env::var("PROVIDER_TIMEOUT_MS")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8_000), // 8 seconds

            // Enrichment cache
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86_400), // 24 hours

            // Batch filtering
            enrich_concurrency: env::var("ENRICH_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),

            // Filter policy (all tunable without touching the engine)
            always_keep_enabled: env::var("ALWAYS_KEEP_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            always_keep_genres: csv_env(
                "ALWAYS_KEEP_GENRES",
                &["Thriller", "Horror", "Sci-Fi", "Action", "Crime"],
            ),
            hard_melodrama_genres: csv_env(
                "HARD_MELODRAMA_GENRES",
                &["Romance", "Melodrama", "Family"],
            ),
            professional_genres: csv_env("PROFESSIONAL_GENRES", &["Medical", "Legal", "Comedy"]),
            kdrama_subgenres: csv_env(
                "KDRAMA_SUBGENRES",
                &["Romance", "Comedy", "Medical", "Legal", "Family", "Melodrama"],
            ),
            kdrama_subgenre_threshold: env::var("KDRAMA_SUBGENRE_THRESHOLD")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
            professional_keywords: csv_env(
                "PROFESSIONAL_KEYWORDS",
                &[
                    "doctor",
                    "hospital",
                    "surgeon",
                    "medical",
                    "lawyer",
                    "legal",
                    "court",
                    "judge",
                    "prosecutor",
                ],
            ),
            blocked_keywords: csv_env(
                "BLOCKED_KEYWORDS",
                &[
                    "k-drama",
                    "kdrama",
                    "korean drama",
                    "chinese drama",
                    "cdrama",
                    "bollywood",
                    "tollywood",
                    "indian movie",
                ],
            ),
            extra_blacklist: csv_env("EXTRA_BLACKLIST", &[]),

            // Misc
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| format!("RegionFilterAddon/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Read a comma-separated env var, falling back to a fixed default list
fn csv_env(name: &str, defaults: &[&str]) -> Vec<String> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => defaults.iter().map(|s| s.to_string()).collect(),
    }
}
