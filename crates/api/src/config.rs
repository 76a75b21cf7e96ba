use serde::{Deserialize, Serialize};
use shared::api::MAX_FILE_BYTES;

/// Server configuration, read from `VANISH_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQLite URL, e.g. `sqlite://data/content.db`.
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Directory uploaded files are written to.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// How often the reaper sweeps for expired content.
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,
    /// Requests allowed per client IP per window. 0 disables rate limiting.
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: usize,
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    /// Set to "production" for JSON logging, anything else for human-readable.
    #[serde(default)]
    pub env: String,
    /// Sentry DSN for error tracking
    #[serde(default)]
    pub sentry_dsn: Option<String>,
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    pub fn rate_limit_enabled(&self) -> bool {
        self.rate_limit_max_requests > 0
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3001
}

fn default_database_url() -> String {
    "sqlite://data/content.db".into()
}

fn default_upload_dir() -> String {
    "uploads".into()
}

fn default_max_upload_bytes() -> usize {
    MAX_FILE_BYTES
}

fn default_reap_interval_secs() -> u64 {
    30
}

fn default_rate_limit_max_requests() -> usize {
    60
}

fn default_rate_limit_window_secs() -> u64 {
    60
}
