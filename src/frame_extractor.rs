// CivicTV - Frame Extractor
// Produces still frames from archive videos on demand
// Uses FFmpeg for probing and extraction

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

/// A rasterized video frame, encoded as a JPEG data URL at the media's
/// native pixel dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameData {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    pub timestamp_secs: f64,
}

/// Seam between the thumbnail cache and the media decoder.
///
/// Generation is two-stage: probe metadata first, then seek and rasterize.
/// Implementations must release any transient decode artifacts after each
/// attempt, success or failure.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Media duration in seconds (the metadata-only stage).
    async fn probe_duration(&self, source: &str) -> Result<f64, String>;

    /// Capture the frame at `timestamp` (first available frame when absent
    /// or non-positive).
    async fn capture_frame(&self, source: &str, timestamp: Option<f64>)
        -> Result<FrameData, String>;
}

/// Frame source backed by the ffmpeg/ffprobe binaries.
pub struct FfmpegExtractor {
    /// JPEG quality (1-100)
    jpeg_quality: u32,
}

impl FfmpegExtractor {
    pub fn new() -> Self {
        Self { jpeg_quality: 80 }
    }

    /// Extract one frame to a transient file and encode it in memory.
    /// The temp file is removed when the guard drops, on every path.
    async fn extract_frame(&self, source: &str, timestamp_secs: f64) -> Result<FrameData, String> {
        let output = tempfile::Builder::new()
            .prefix("civictv_frame_")
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| format!("Failed to create temp frame file: {}", e))?;
        let output_path = output
            .path()
            .to_str()
            .ok_or("Temp frame path is not valid UTF-8")?
            .to_string();

        let status = Command::new("ffmpeg")
            .args([
                "-ss",
                &format!("{:.3}", timestamp_secs),
                "-i",
                source,
                "-vframes",
                "1",
                "-q:v",
                &format!("{}", (100 - self.jpeg_quality) / 3 + 1),
                "-y",
                &output_path,
            ])
            .output()
            .await
            .map_err(|e| format!("Failed to run ffmpeg: {}", e))?;

        if !status.status.success() {
            let stderr = String::from_utf8_lossy(&status.stderr);
            return Err(format!("ffmpeg failed: {}", stderr));
        }

        let bytes = std::fs::read(output.path())
            .map_err(|e| format!("Failed to read extracted frame: {}", e))?;
        if bytes.is_empty() {
            return Err("ffmpeg produced an empty frame".to_string());
        }

        let (width, height) = image::load_from_memory(&bytes)
            .map(|img| (img.width(), img.height()))
            .map_err(|e| format!("Failed to decode extracted frame: {}", e))?;

        Ok(FrameData {
            data_url: encode_data_url(&bytes),
            width,
            height,
            timestamp_secs,
        })
    }
}

#[async_trait]
impl FrameSource for FfmpegExtractor {
    async fn probe_duration(&self, source: &str) -> Result<f64, String> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                source,
            ])
            .output()
            .await
            .map_err(|e| format!("Failed to run ffprobe: {}", e))?;

        parse_duration_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn capture_frame(
        &self,
        source: &str,
        timestamp: Option<f64>,
    ) -> Result<FrameData, String> {
        // Metadata stage: a failed probe fails the whole generation, the
        // same way a metadata load error aborts a decode.
        let duration = self.probe_duration(source).await?;

        let seek_to = match timestamp {
            Some(t) if t > 0.0 => t.min(duration),
            _ => 0.0,
        };

        self.extract_frame(source, seek_to).await
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_data_url(jpeg_bytes: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(jpeg_bytes)
    )
}

fn parse_duration_output(stdout: &str) -> Result<f64, String> {
    stdout
        .trim()
        .parse::<f64>()
        .map_err(|_| "Failed to parse duration".to_string())
}
