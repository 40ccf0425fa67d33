//! Environment-driven service configuration.

use std::env;

/// All service knobs, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: String,
    pub poll_interval_secs: u64,
    /// Subreddits scanned in order; earlier entries are favored when the
    /// per-run comment target is reached mid-scan.
    pub subreddits: Vec<String>,
    /// Matched comments collected per run before ingestion stops.
    pub comment_target: usize,
    /// Posts older than this are not scanned.
    pub lookback_hours: i64,
    /// Clustering corpus covers this many days of persisted comments.
    pub summary_window_days: i64,
    /// Fixed chunk width (characters) for hierarchical summarization.
    pub chunk_max_chars: usize,
    pub summary_min_length: u32,
    pub summary_max_length: u32,
    /// 0 = auto (tenth of the corpus, minimum 2).
    pub min_cluster_size: usize,
    pub model_server_url: String,
    pub entity_seed_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_var("REDDIT_MONITOR_PORT", 9104),
            db_path: env::var("REDDIT_MONITOR_DB_PATH")
                .unwrap_or_else(|_| "./reddit_monitor.db".to_string()),
            poll_interval_secs: parse_var("REDDIT_MONITOR_POLL_INTERVAL", 900),
            subreddits: env::var("REDDIT_MONITOR_SUBREDDITS")
                .unwrap_or_else(|_| {
                    "wallstreetbets,investing,stocks,SecurityAnalysis,finance".to_string()
                })
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            comment_target: parse_var("REDDIT_MONITOR_COMMENT_TARGET", 100),
            lookback_hours: parse_var("REDDIT_MONITOR_LOOKBACK_HOURS", 24),
            summary_window_days: parse_var("REDDIT_MONITOR_SUMMARY_WINDOW_DAYS", 3),
            chunk_max_chars: parse_var("REDDIT_MONITOR_CHUNK_MAX_CHARS", 1000),
            summary_min_length: parse_var("REDDIT_MONITOR_SUMMARY_MIN_LENGTH", 30),
            summary_max_length: parse_var("REDDIT_MONITOR_SUMMARY_MAX_LENGTH", 150),
            min_cluster_size: parse_var("REDDIT_MONITOR_MIN_CLUSTER_SIZE", 0),
            model_server_url: env::var("MODEL_SERVER_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8601".to_string()),
            entity_seed_path: env::var("REDDIT_MONITOR_ENTITY_SEED").ok(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
