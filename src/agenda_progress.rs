// CivicTV - Agenda Progress
// Derives per-item status and fractional progress from the playback clock.
//
// Both functions here are pure: status and progress are re-derivable from
// (items, current_seconds) alone, so the UI layer can recompute on every
// time-update tick without drift.

use serde::{Deserialize, Serialize};

/// A named point in a meeting's proceedings.
///
/// Items are ordered and `start_seconds` is non-decreasing across the
/// sequence. An item's effective end is the next item's start, or the
/// media duration for the last item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgendaItem {
    pub id: u32,
    pub title: String,
    pub start_seconds: u64,
    pub summary: String,
}

impl AgendaItem {
    pub fn new(id: u32, title: &str, start_seconds: u64) -> Self {
        Self {
            id,
            title: title.to_string(),
            start_seconds,
            summary: String::new(),
        }
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }
}

/// Playback status of an agenda item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgendaStatus {
    Upcoming,
    Current,
    Completed,
}

impl AgendaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Current => "current",
            Self::Completed => "completed",
        }
    }

    /// Marker glyph used in agenda list rendering.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Upcoming => "○",
            Self::Current => "▶",
            Self::Completed => "✓",
        }
    }
}

/// Status of `items[index]` at playback position `current_seconds`.
pub fn status_of(items: &[AgendaItem], index: usize, current_seconds: f64) -> AgendaStatus {
    let item = &items[index];

    if current_seconds < item.start_seconds as f64 {
        return AgendaStatus::Upcoming;
    }
    if let Some(next) = items.get(index + 1) {
        if current_seconds >= next.start_seconds as f64 {
            return AgendaStatus::Completed;
        }
    }
    // The last item stays current indefinitely once reached.
    AgendaStatus::Current
}

/// Fractional progress through `items[index]`, in [0, 1].
///
/// Zero unless the item is current, and zero for the last item (no defined
/// upper bound).
pub fn progress_of(items: &[AgendaItem], index: usize, current_seconds: f64) -> f32 {
    if status_of(items, index, current_seconds) != AgendaStatus::Current {
        return 0.0;
    }

    let start = items[index].start_seconds as f64;
    let end = match items.get(index + 1) {
        Some(next) => next.start_seconds as f64,
        None => return 0.0,
    };
    if end <= start {
        return 0.0;
    }

    (((current_seconds - start) / (end - start)) as f32).clamp(0.0, 1.0)
}
