// CivicTV - Time Index
// Conversions between formatted clock strings and seconds, and lookup of
// the segment active at a given playback position.
//
// This module provides:
// 1. Clock string parsing ("M:SS" / "H:MM:SS") with tagged invalid results
// 2. Seconds formatting for time displays
// 3. Active-segment lookup over an ordered segment list

use serde::{Deserialize, Serialize};

/// A labeled sub-interval of a meeting recording.
///
/// Segments are ordered; insertion order is chronological order, and the
/// list is immutable once loaded for a given meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start_seconds: u64,
    pub end_seconds: u64,
    pub title: String,
    pub summary: String,
}

impl Segment {
    pub fn new(start_seconds: u64, end_seconds: u64, title: &str, summary: &str) -> Self {
        Self {
            start_seconds,
            end_seconds,
            title: title.to_string(),
            summary: summary.to_string(),
        }
    }

    /// Build a segment from a "14:23-16:30" style range string.
    /// Returns None when either side of the range fails to parse.
    pub fn from_range(range: &str, title: &str, summary: &str) -> Option<Self> {
        let (start, end) = parse_time_range(range)?;
        Some(Self::new(start, end, title, summary))
    }
}

/// Result of parsing a clock string.
///
/// Malformed input is carried as `Invalid` with the original text so the
/// caller decides whether to log, display, or degrade to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTime {
    Valid(u64),
    Invalid(String),
}

impl ParsedTime {
    /// Degrade malformed input to zero seconds. Never panics.
    pub fn seconds_or_zero(&self) -> u64 {
        match self {
            Self::Valid(secs) => *secs,
            Self::Invalid(_) => 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Parse "M:SS" or "H:MM:SS" into seconds.
pub fn parse_time(text: &str) -> ParsedTime {
    let parts: Vec<&str> = text.trim().split(':').collect();

    let numbers: Option<Vec<u64>> = parts
        .iter()
        .map(|p| {
            if p.is_empty() {
                None
            } else {
                p.parse::<u64>().ok()
            }
        })
        .collect();

    match numbers.as_deref() {
        Some([m, s]) => ParsedTime::Valid(m * 60 + s),
        Some([h, m, s]) => ParsedTime::Valid(h * 3600 + m * 60 + s),
        _ => ParsedTime::Invalid(text.to_string()),
    }
}

/// Parse a "start-end" range of clock strings.
pub fn parse_time_range(text: &str) -> Option<(u64, u64)> {
    let (start, end) = text.split_once('-')?;
    match (parse_time(start), parse_time(end)) {
        (ParsedTime::Valid(s), ParsedTime::Valid(e)) => Some((s, e)),
        _ => None,
    }
}

/// Format seconds as "M:SS", or "H:MM:SS" at one hour and beyond.
pub fn format_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Index of the segment active at `current_seconds`.
///
/// Returns `i` such that `segments[i].start <= t < segments[i+1].start`
/// (the last segment is bounded by its own end). `None` when the position
/// precedes the first segment's start or follows the last segment's end.
pub fn find_active_segment(segments: &[Segment], current_seconds: f64) -> Option<usize> {
    for (i, segment) in segments.iter().enumerate() {
        let upper = match segments.get(i + 1) {
            Some(next) => next.start_seconds as f64,
            None => segment.end_seconds as f64,
        };
        if current_seconds >= segment.start_seconds as f64 && current_seconds < upper {
            return Some(i);
        }
    }
    None
}
