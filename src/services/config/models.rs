use std::time::Duration;

/// Default allow-list, newest expansion first.
pub const DEFAULT_EXPANSIONS: &[&str] = &[
    "WOE", "LTR", "MOM", "ONE", "BRO", "DMU", "HBG", "SNC", "NEO", "VOW", "MID", "AFR",
];

/// `[[Card Name]]`; the single capture group is the reference.
pub const DEFAULT_REFERENCE_PATTERN: &str = r"\[\[([^\[\]]+)\]\]";

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub username: String,
    pub password: String,
}

/// Knobs of the resolution engine and the comment pipeline.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Ordered allow-list of expansion codes (upper-case).
    pub supported_expansions: Vec<String>,
    pub ratings_format: String,
    /// `YYYY-MM-DD`, validated on load.
    pub ratings_start_date: Option<String>,
    pub index_ttl: Duration,
    /// Back-off before retrying an index rebuild that did not fully succeed.
    pub index_retry: Duration,
    pub ratings_ttl: Duration,
    pub similarity_threshold: f64,
    pub reply_cooldown: Duration,
    pub reference_pattern: String,
    /// Reply-guard entries older than this are forgotten.
    pub guard_retention: Duration,
    pub guard_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            supported_expansions: DEFAULT_EXPANSIONS.iter().map(|s| s.to_string()).collect(),
            ratings_format: "PremierDraft".into(),
            ratings_start_date: None,
            index_ttl: Duration::from_secs(24 * 60 * 60),
            index_retry: Duration::from_secs(5 * 60),
            ratings_ttl: Duration::from_secs(12 * 60 * 60),
            similarity_threshold: 0.8,
            reply_cooldown: Duration::from_secs(10 * 60),
            reference_pattern: DEFAULT_REFERENCE_PATTERN.into(),
            guard_retention: Duration::from_secs(48 * 60 * 60),
            guard_capacity: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub reddit: RedditCredentials,
    pub subreddit: String,
    pub poll_interval: Duration,
    pub engine: EngineConfig,
}
