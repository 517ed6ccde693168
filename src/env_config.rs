// CivicTV - Environment Configuration Loader
// Loads default settings from .env file if present

use std::env;
use std::time::Duration;

/// The single externally supplied API host. Every historical client call
/// site resolves through this one value.
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

pub struct EnvConfig {
    /// Base URL of the summary/timestamps/generate API.
    pub api_base_url: String,
    /// Directory serving the archive media files.
    pub video_dir: String,
    /// Directory of static fallback thumbnails.
    pub thumbnail_dir: String,
    /// Attempt ceiling for the summary/timestamp client.
    pub max_retries: u32,
    /// Base backoff delay, doubled per attempt.
    pub retry_base_delay: Duration,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            video_dir: "/videos".to_string(),
            thumbnail_dir: "/thumbnails".to_string(),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
        }
    }
}

impl EnvConfig {
    /// Load environment configuration from .env file
    pub fn load() -> Self {
        // Try to load .env from project root
        let _ = dotenvy::dotenv();

        // Also try from user's home directory
        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".civictv").join(".env");
            if home_env.exists() {
                let _ = dotenvy::from_path(home_env);
            }
        }

        let defaults = Self::default();

        Self {
            api_base_url: env::var("CIVICTV_API_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|url| validate_base_url(&url).unwrap_or(defaults.api_base_url.clone()))
                .unwrap_or(defaults.api_base_url.clone()),
            video_dir: env::var("CIVICTV_VIDEO_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.video_dir),
            thumbnail_dir: env::var("CIVICTV_THUMBNAIL_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.thumbnail_dir),
            max_retries: env::var("CIVICTV_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_base_delay: env::var("CIVICTV_RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
        }
    }
}

/// Accept only absolute http(s) URLs, normalized without a trailing slash.
fn validate_base_url(raw: &str) -> Option<String> {
    match url::Url::parse(raw) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
            Some(raw.trim_end_matches('/').to_string())
        }
        Ok(parsed) => {
            log::warn!("Ignoring API base URL with scheme '{}': {}", parsed.scheme(), raw);
            None
        }
        Err(e) => {
            log::warn!("Ignoring malformed API base URL '{}': {}", raw, e);
            None
        }
    }
}
