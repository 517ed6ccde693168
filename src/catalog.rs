// CivicTV - Video Catalog
// In-memory library of archived meeting recordings
//
// This module provides:
// 1. The built-in demo catalog of Board of Supervisors clips
// 2. Lookup, featured selection, and naive substring search
// 3. Duration refresh by probing the media files

use serde::{Deserialize, Serialize};

use crate::frame_extractor::FrameSource;
use crate::time_index;

/// Duration shown when a media file cannot be probed.
const FALLBACK_DURATION: &str = "15:00";

/// An archived meeting recording with its display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingVideo {
    pub id: String,
    pub title: String,
    pub date: String,
    pub duration: String,
    pub speakers: Vec<String>,
    pub summary: String,
    pub tags: Vec<String>,
    pub video_url: String,
    pub clip_id: String,
    pub view_id: String,
    /// Start offset for featured/most-watched deep links.
    pub start_time: Option<f64>,
}

impl MeetingVideo {
    fn seed(
        id: &str,
        title: &str,
        date: &str,
        duration: &str,
        speakers: &[&str],
        summary: &str,
        tags: &[&str],
    ) -> Self {
        let (clip_id, view_id) = id.split_once('_').unwrap_or((id, "10"));
        Self {
            id: id.to_string(),
            title: title.to_string(),
            date: date.to_string(),
            duration: duration.to_string(),
            speakers: speakers.iter().map(|s| s.to_string()).collect(),
            summary: summary.to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            video_url: format!("/videos/{}.mp4", id),
            clip_id: clip_id.to_string(),
            view_id: view_id.to_string(),
            start_time: None,
        }
    }
}

/// The loaded video list. Immutable apart from metadata refresh; filtering
/// never mutates the list.
pub struct VideoCatalog {
    videos: Vec<MeetingVideo>,
}

impl VideoCatalog {
    pub fn new(videos: Vec<MeetingVideo>) -> Self {
        Self { videos }
    }

    /// The built-in demo set of archived board meetings.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            MeetingVideo::seed(
                "50121_10",
                "Board of Supervisors Meeting",
                "Jan 15",
                "23 min",
                &["Supervisor Johnson"],
                "New affordable housing rules for SOMA. Passed 7-4 with 18% requirement.",
                &["housing", "development", "affordable"],
            ),
            MeetingVideo::seed(
                "50188_10",
                "Transit Budget Discussion",
                "Jan 10",
                "18 min",
                &["Supervisor Martinez"],
                "Muni funding changes and Market St bike lanes. $15M approved for infrastructure upgrades.",
                &["transportation", "budget", "infrastructure"],
            ),
            MeetingVideo::seed(
                "50291_10",
                "Small Business Relief",
                "Jan 8",
                "15 min",
                &["Public Comments"],
                "Citizens request construction impact relief. Committee formed to review proposals.",
                &["business", "relief", "public-comment"],
            ),
            MeetingVideo::seed(
                "50412_10",
                "Public Safety Budget",
                "Jan 5",
                "22 min",
                &["Chief of Police"],
                "Discussion on police department budget allocation and community safety initiatives.",
                &["public-safety", "budget", "police"],
            ),
            MeetingVideo::seed(
                "50523_10",
                "Environmental Policy",
                "Dec 28",
                "19 min",
                &["Environmental Committee"],
                "New environmental policies and climate action initiatives for the city.",
                &["environment", "climate", "policy"],
            ),
        ])
    }

    pub fn all(&self) -> &[MeetingVideo] {
        &self.videos
    }

    /// Lookup by id. A missing id is an ordinary "not found" state for the
    /// caller to render, never a panic.
    pub fn get(&self, id: &str) -> Option<&MeetingVideo> {
        self.videos.iter().find(|v| v.id == id)
    }

    /// Featured selection: the first four videos.
    pub fn popular(&self) -> &[MeetingVideo] {
        &self.videos[..self.videos.len().min(4)]
    }

    /// Naive case-insensitive substring match over title, summary, and
    /// tags. A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<&MeetingVideo> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.videos.iter().collect();
        }

        self.videos
            .iter()
            .filter(|v| {
                v.title.to_lowercase().contains(&needle)
                    || v.summary.to_lowercase().contains(&needle)
                    || v.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Probe each video file and replace the seeded duration with the real
    /// one, formatted as a clock string. Probe failures keep a fixed
    /// fallback duration. Dates come from the per-clip recording table in
    /// both cases.
    pub async fn refresh_metadata(&mut self, probe: &dyn FrameSource) {
        for video in &mut self.videos {
            match probe.probe_duration(&video.video_url).await {
                Ok(duration) => {
                    video.duration = time_index::format_seconds(duration as u64);
                }
                Err(e) => {
                    log::warn!("Failed to load metadata for {}: {}", video.id, e);
                    video.duration = FALLBACK_DURATION.to_string();
                }
            }
            video.date = date_for_clip(&video.clip_id).to_string();
        }
    }
}

/// Recording dates by clip id.
fn date_for_clip(clip_id: &str) -> &'static str {
    match clip_id {
        "50121" => "Jun 3",
        "50188" => "Jun 10",
        "50291" => "Jun 24",
        "50412" => "Jul 15",
        "50523" => "Jul 29",
        _ => "Jan 1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_extractor::FrameData;
    use async_trait::async_trait;

    struct FixedProbe {
        result: Result<f64, String>,
    }

    #[async_trait]
    impl FrameSource for FixedProbe {
        async fn probe_duration(&self, _source: &str) -> Result<f64, String> {
            self.result.clone()
        }

        async fn capture_frame(
            &self,
            _source: &str,
            _timestamp: Option<f64>,
        ) -> Result<FrameData, String> {
            Err("not used".to_string())
        }
    }

    #[test]
    fn test_default_catalog() {
        let catalog = VideoCatalog::with_defaults();
        assert_eq!(catalog.all().len(), 5);
        assert_eq!(catalog.popular().len(), 4);

        let video = catalog.get("50121_10").expect("seeded video");
        assert_eq!(video.clip_id, "50121");
        assert_eq!(video.view_id, "10");
        assert_eq!(video.video_url, "/videos/50121_10.mp4");
    }

    #[test]
    fn test_get_missing_id_is_none() {
        let catalog = VideoCatalog::with_defaults();
        assert!(catalog.get("99999_10").is_none());
    }

    #[test]
    fn test_search_matches_title_summary_and_tags() {
        let catalog = VideoCatalog::with_defaults();

        let by_tag = catalog.search("housing");
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].id, "50121_10");

        let by_query = catalog.search("BUDGET");
        assert!(by_query.len() >= 2, "case-insensitive match over tags and summaries");

        assert!(catalog.search("zoning").is_empty());
    }

    #[test]
    fn test_blank_query_matches_everything() {
        let catalog = VideoCatalog::with_defaults();
        assert_eq!(catalog.search("   ").len(), 5);
    }

    #[tokio::test]
    async fn test_refresh_metadata_formats_probed_duration() {
        let mut catalog = VideoCatalog::with_defaults();
        catalog
            .refresh_metadata(&FixedProbe { result: Ok(1382.64) })
            .await;

        let video = catalog.get("50121_10").unwrap();
        assert_eq!(video.duration, "23:02");
        assert_eq!(video.date, "Jun 3");
    }

    #[tokio::test]
    async fn test_refresh_metadata_falls_back_on_probe_failure() {
        let mut catalog = VideoCatalog::with_defaults();
        catalog
            .refresh_metadata(&FixedProbe {
                result: Err("no such file".to_string()),
            })
            .await;

        let video = catalog.get("50523_10").unwrap();
        assert_eq!(video.duration, "15:00");
        assert_eq!(video.date, "Jul 29");
    }
}
