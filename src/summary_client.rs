// CivicTV - Summary API Client
// Fetches per-meeting summary and timestamp data from the archive API
//
// This module provides:
// 1. /summary and /timestamps fetches with bounded retry + backoff
// 2. Session-lifetime response caching keyed by (clip_id, view_id)
// 3. Cache management accessors for diagnostics

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Summary of a single agenda item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgendaSummary {
    pub agenda_name: String,
    pub agenda_summary: String,
}

/// Response of `GET /summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub meeting_summary: String,
    pub agenda_summary: Vec<AgendaSummary>,
    pub tags: Option<Vec<String>>,
}

/// One entry of `GET /timestamps`, ordered chronologically by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampItem {
    pub time_seconds: f64,
    pub time_formatted: String,
    pub agenda_name: String,
}

/// Cache contents snapshot for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub summary_count: usize,
    pub timestamp_count: usize,
    pub summary_keys: Vec<String>,
    pub timestamp_keys: Vec<String>,
}

/// Client for the remote summary/timestamp endpoints.
pub struct SummaryClient {
    base_url: String,
    client: reqwest::Client,
    max_retries: u32,
    retry_base_delay: Duration,
    summary_cache: Mutex<HashMap<String, SummaryResponse>>,
    timestamp_cache: Mutex<HashMap<String, Vec<TimestampItem>>>,
}

impl SummaryClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_retry(base_url, 3, Duration::from_millis(1000))
    }

    pub fn with_retry(base_url: &str, max_retries: u32, retry_base_delay: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap(),
            max_retries,
            retry_base_delay,
            summary_cache: Mutex::new(HashMap::new()),
            timestamp_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the meeting summary for a clip/view pair, consulting the
    /// session cache first.
    pub async fn fetch_summary(
        &self,
        clip_id: &str,
        view_id: &str,
    ) -> Result<SummaryResponse, ApiError> {
        let cache_key = format!("{}_{}", clip_id, view_id);

        if let Some(hit) = self.summary_cache.lock().get(&cache_key) {
            log::info!("Using cached summary for {}", cache_key);
            return Ok(hit.clone());
        }

        let data: SummaryResponse = self
            .get_json("/summary", &[("clip_id", clip_id), ("view_id", view_id)])
            .await?;

        self.summary_cache.lock().insert(cache_key.clone(), data.clone());
        log::info!("Cached summary for {}", cache_key);
        Ok(data)
    }

    /// Fetch the ordered agenda timestamps for a clip/view pair,
    /// consulting the session cache first.
    pub async fn fetch_timestamps(
        &self,
        clip_id: &str,
        view_id: &str,
    ) -> Result<Vec<TimestampItem>, ApiError> {
        let cache_key = format!("{}_{}", clip_id, view_id);

        if let Some(hit) = self.timestamp_cache.lock().get(&cache_key) {
            log::info!("Using cached timestamps for {}", cache_key);
            return Ok(hit.clone());
        }

        let data: Vec<TimestampItem> = self
            .get_json("/timestamps", &[("clip_id", clip_id), ("view_id", view_id)])
            .await?;

        self.timestamp_cache.lock().insert(cache_key.clone(), data.clone());
        log::info!("Cached timestamps for {}", cache_key);
        Ok(data)
    }

    /// Empty both response caches. Diagnostics/testing only; not part of
    /// the normal request flow.
    pub fn clear_cache(&self) {
        self.summary_cache.lock().clear();
        self.timestamp_cache.lock().clear();
        log::info!("API cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        let summaries = self.summary_cache.lock();
        let timestamps = self.timestamp_cache.lock();
        CacheStats {
            summary_count: summaries.len(),
            timestamp_count: timestamps.len(),
            summary_keys: summaries.keys().cloned().collect(),
            timestamp_keys: timestamps.keys().cloned().collect(),
        }
    }

    /// GET with bounded retry. A non-2xx status or transport failure
    /// retries after an exponentially increasing delay (base, then 2x
    /// base); the last error is propagated once attempts are exhausted.
    /// A decode failure on a successful response is not retried.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error = ApiError::Transport("no request attempted".to_string());

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                let wait = self.retry_base_delay * 2u32.pow(attempt - 2);
                log::info!("Retrying {} in {}ms", url, wait.as_millis());
                tokio::time::sleep(wait).await;
            }

            match self.client.get(&url).query(query).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .json::<T>()
                        .await
                        .map_err(|e| ApiError::Decode(e.to_string()));
                }
                Ok(resp) => {
                    last_error = ApiError::Status(resp.status().as_u16());
                }
                Err(e) => {
                    last_error = ApiError::Transport(e.to_string());
                }
            }

            log::warn!(
                "Attempt {}/{} failed for {}: {}",
                attempt,
                self.max_retries,
                url,
                last_error
            );
        }

        Err(last_error)
    }
}
