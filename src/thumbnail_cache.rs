// CivicTV - Thumbnail Cache
// Session-wide cache of generated video thumbnails, keyed by
// (video id, timestamp). Concurrent requests for the same key are
// coalesced into a single generation cycle, and generation failures
// degrade to the static fallback path without surfacing an error.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::frame_extractor::FrameSource;

type PendingThumbnail = Shared<BoxFuture<'static, String>>;

/// Cache of resolved thumbnails plus the in-flight generation map.
///
/// Explicitly constructed and injected into consumers; the process-wide
/// instance lives on `ArchiveState`.
pub struct ThumbnailCache {
    generator: Arc<dyn FrameSource>,
    fallback_dir: String,
    resolved: Arc<Mutex<HashMap<String, String>>>,
    in_flight: Arc<Mutex<HashMap<String, PendingThumbnail>>>,
}

impl ThumbnailCache {
    pub fn new(generator: Arc<dyn FrameSource>) -> Self {
        Self::with_fallback_dir(generator, "/thumbnails")
    }

    pub fn with_fallback_dir(generator: Arc<dyn FrameSource>, fallback_dir: &str) -> Self {
        Self {
            generator,
            fallback_dir: fallback_dir.trim_end_matches('/').to_string(),
            resolved: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get or generate the thumbnail for a video at an optional timestamp.
    ///
    /// Never fails: any probe/decode error resolves to the fallback path
    /// derived from `video_id`. Failures are not cached, so a later call
    /// for the same key retries the generation.
    pub async fn get_thumbnail(
        &self,
        video_id: &str,
        source_location: &str,
        timestamp: Option<f64>,
    ) -> String {
        let key = cache_key(video_id, timestamp);

        if let Some(hit) = self.resolved.lock().get(&key) {
            return hit.clone();
        }

        let pending = {
            let mut in_flight = self.in_flight.lock();
            if let Some(pending) = in_flight.get(&key) {
                pending.clone()
            } else if let Some(hit) = self.resolved.lock().get(&key) {
                // Generation finished between the resolved check above and
                // taking the in-flight lock.
                return hit.clone();
            } else {
                let pending =
                    self.start_generation(key.clone(), video_id, source_location, timestamp);
                in_flight.insert(key, pending.clone());
                pending
            }
        };

        pending.await
    }

    /// Static fallback image path for a video.
    pub fn fallback_path(&self, video_id: &str) -> String {
        format!("{}/{}.jpg", self.fallback_dir, video_id)
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        self.resolved.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.lock().is_empty()
    }

    /// Drop all resolved thumbnails. In-flight generations are left to
    /// finish and repopulate their entries.
    pub fn clear(&self) {
        self.resolved.lock().clear();
        log::info!("Thumbnail cache cleared");
    }

    fn start_generation(
        &self,
        key: String,
        video_id: &str,
        source_location: &str,
        timestamp: Option<f64>,
    ) -> PendingThumbnail {
        let generator = Arc::clone(&self.generator);
        let resolved = Arc::clone(&self.resolved);
        let in_flight = Arc::clone(&self.in_flight);
        let fallback = self.fallback_path(video_id);
        let video_id = video_id.to_string();
        let source = source_location.to_string();

        let task_key = key.clone();
        let task_fallback = fallback.clone();

        // Spawned so the generation runs to completion even if every
        // requester has gone away; the finished entry benefits later
        // requests for the same key.
        let task = tokio::spawn(async move {
            match generator.capture_frame(&source, timestamp).await {
                Ok(frame) => {
                    log::info!(
                        "Generated {}x{} thumbnail for {} ({})",
                        frame.width,
                        frame.height,
                        video_id,
                        task_key
                    );
                    resolved.lock().insert(task_key.clone(), frame.data_url.clone());
                    in_flight.lock().remove(&task_key);
                    frame.data_url
                }
                Err(e) => {
                    log::warn!(
                        "Thumbnail generation failed for {} at {:?}: {}",
                        video_id,
                        timestamp,
                        e
                    );
                    // Clearing the pending entry without populating the
                    // resolved cache lets a later request retry.
                    in_flight.lock().remove(&task_key);
                    task_fallback
                }
            }
        });

        let in_flight = Arc::clone(&self.in_flight);
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    log::error!("Thumbnail generation task failed: {}", e);
                    in_flight.lock().remove(&key);
                    fallback
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn cache_key(video_id: &str, timestamp: Option<f64>) -> String {
    format!("{}_{}", video_id, timestamp.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_extractor::FrameData;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockFrameSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MockFrameSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FrameSource for MockFrameSource {
        async fn probe_duration(&self, _source: &str) -> Result<f64, String> {
            Ok(900.0)
        }

        async fn capture_frame(
            &self,
            _source: &str,
            timestamp: Option<f64>,
        ) -> Result<FrameData, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Long enough that concurrent requests overlap the decode.
            tokio::time::sleep(Duration::from_millis(30)).await;
            if self.fail {
                return Err("decode error".to_string());
            }
            let ts = timestamp.unwrap_or(0.0);
            Ok(FrameData {
                data_url: format!("data:image/jpeg;base64,frame-at-{}", ts),
                width: 640,
                height: 360,
                timestamp_secs: ts,
            })
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_coalesce() {
        let source = MockFrameSource::new(false);
        let cache = ThumbnailCache::new(source.clone());

        let (a, b) = tokio::join!(
            cache.get_thumbnail("50121_10", "/videos/50121_10.mp4", Some(135.0)),
            cache.get_thumbnail("50121_10", "/videos/50121_10.mp4", Some(135.0)),
        );

        assert_eq!(a, b);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_generation() {
        let source = MockFrameSource::new(false);
        let cache = ThumbnailCache::new(source.clone());

        let first = cache
            .get_thumbnail("50188_10", "/videos/50188_10.mp4", Some(60.0))
            .await;
        let second = cache
            .get_thumbnail("50188_10", "/videos/50188_10.mp4", Some(60.0))
            .await;

        assert_eq!(first, second);
        assert_eq!(source.call_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_timestamps_generate_separately() {
        let source = MockFrameSource::new(false);
        let cache = ThumbnailCache::new(source.clone());

        cache
            .get_thumbnail("50291_10", "/videos/50291_10.mp4", Some(10.0))
            .await;
        cache
            .get_thumbnail("50291_10", "/videos/50291_10.mp4", Some(20.0))
            .await;

        assert_eq!(source.call_count(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_timestamp_keys_as_zero() {
        let source = MockFrameSource::new(false);
        let cache = ThumbnailCache::new(source.clone());

        cache
            .get_thumbnail("50412_10", "/videos/50412_10.mp4", None)
            .await;
        cache
            .get_thumbnail("50412_10", "/videos/50412_10.mp4", Some(0.0))
            .await;

        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_falls_back_and_is_not_cached() {
        let source = MockFrameSource::new(true);
        let cache = ThumbnailCache::new(source.clone());

        let result = cache
            .get_thumbnail("50523_10", "/videos/50523_10.mp4", Some(30.0))
            .await;

        assert_eq!(result, "/thumbnails/50523_10.jpg");
        assert!(cache.is_empty());

        // The pending entry was cleared, so the next request retries.
        cache
            .get_thumbnail("50523_10", "/videos/50523_10.mp4", Some(30.0))
            .await;
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_forces_regeneration() {
        let source = MockFrameSource::new(false);
        let cache = ThumbnailCache::new(source.clone());

        cache
            .get_thumbnail("50121_10", "/videos/50121_10.mp4", None)
            .await;
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());

        cache
            .get_thumbnail("50121_10", "/videos/50121_10.mp4", None)
            .await;
        assert_eq!(source.call_count(), 2);
    }
}
