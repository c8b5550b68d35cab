//! Configuration module

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Seconds between scheduled refresh cycles
    pub refresh_interval_seconds: u64,

    /// TTL applied to every cache write
    pub cache_ttl_seconds: u64,

    /// Per-feed fetch timeout
    pub feed_timeout_seconds: u64,

    /// Directory of JSON feed files; unset means no file feeds
    pub feed_dir: Option<String>,

    /// SQLite cache path; unset means in-memory cache
    pub cache_db_path: Option<String>,

    /// Path to a JSON profile set; unset means the built-in set
    pub profile_path: Option<String>,

    /// Size of the precomputed top-threats slice
    pub top_n: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            refresh_interval_seconds: env::var("REFRESH_INTERVAL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(900),

            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1800),

            feed_timeout_seconds: env::var("FEED_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),

            feed_dir: env::var("FEED_DIR").ok(),

            cache_db_path: env::var("CACHE_DB_PATH").ok(),

            profile_path: env::var("PROFILE_PATH").ok(),

            top_n: env::var("TOP_N")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(10),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
