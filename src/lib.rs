// CivicTV - Main Library
// Video archive and meeting-assistant core for public government recordings

pub mod agenda_progress;
pub mod catalog;
pub mod chat_client;
pub mod env_config;
pub mod error;
pub mod frame_extractor;
pub mod playback;
pub mod summary_client;
pub mod thumbnail_cache;
pub mod time_index;

use std::sync::Arc;

use catalog::VideoCatalog;
use chat_client::ChatClient;
use env_config::EnvConfig;
use frame_extractor::FfmpegExtractor;
use summary_client::SummaryClient;
use thumbnail_cache::ThumbnailCache;

/// Application state shared across the UI layer.
///
/// All caches and clients are constructed here and injected into their
/// consumers; nothing in the crate is a module-level singleton, so tests
/// and independent sessions build their own state.
pub struct ArchiveState {
    pub config: EnvConfig,
    pub catalog: VideoCatalog,
    pub thumbnails: Arc<ThumbnailCache>,
    pub summaries: Arc<SummaryClient>,
    pub chat: Arc<ChatClient>,
}

impl ArchiveState {
    pub fn new(config: EnvConfig) -> Self {
        log::info!("Initializing archive state (API at {})", config.api_base_url);

        let extractor = Arc::new(FfmpegExtractor::new());
        let thumbnails = Arc::new(ThumbnailCache::with_fallback_dir(
            extractor,
            &config.thumbnail_dir,
        ));
        let summaries = Arc::new(SummaryClient::with_retry(
            &config.api_base_url,
            config.max_retries,
            config.retry_base_delay,
        ));
        let chat = Arc::new(ChatClient::new(&config.api_base_url));

        Self {
            config,
            catalog: VideoCatalog::with_defaults(),
            thumbnails,
            summaries,
            chat,
        }
    }

    /// Construct from `.env`/environment configuration.
    pub fn from_env() -> Self {
        Self::new(EnvConfig::load())
    }
}

/// Initialize logging for binaries and integration harnesses.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
