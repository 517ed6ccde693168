// CivicTV - Playback Controller
// Bridges a media element's continuous playback clock to the pure
// time-index and agenda-progress derivations. Holds only the raw clock
// and the loaded lists; everything displayed is recomputed per tick, so
// displayed status can never drift from the actual position.

use serde::Serialize;

use crate::agenda_progress::{self, AgendaItem, AgendaStatus};
use crate::summary_client::TimestampItem;
use crate::time_index::{self, Segment};

/// Derived status of one agenda item at the current position.
#[derive(Debug, Clone, Serialize)]
pub struct AgendaItemState {
    pub id: u32,
    pub status: AgendaStatus,
    pub progress: f32,
}

/// Everything a player view renders for one tick.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSnapshot {
    pub current_seconds: f64,
    pub duration_seconds: f64,
    pub active_segment: Option<usize>,
    pub agenda: Vec<AgendaItemState>,
    /// "current / duration" clock display, e.g. "5:00 / 23:10".
    pub time_display: String,
    pub progress_percent: f32,
}

pub struct PlaybackController {
    current_seconds: f64,
    duration_seconds: f64,
    segments: Vec<Segment>,
    agenda: Vec<AgendaItem>,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self {
            current_seconds: 0.0,
            duration_seconds: 0.0,
            segments: Vec::new(),
            agenda: Vec::new(),
        }
    }

    pub fn load_segments(&mut self, segments: Vec<Segment>) {
        self.segments = segments;
    }

    pub fn load_agenda(&mut self, agenda: Vec<AgendaItem>) {
        self.agenda = agenda;
    }

    /// Build the agenda list from the API's timestamp records, assigning
    /// sequential ids in arrival (chronological) order.
    pub fn load_agenda_from_timestamps(&mut self, timestamps: &[TimestampItem]) {
        self.agenda = timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| {
                AgendaItem::new(i as u32 + 1, &ts.agenda_name, ts.time_seconds.max(0.0) as u64)
            })
            .collect();
    }

    pub fn current_seconds(&self) -> f64 {
        self.current_seconds
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Handle one "time advanced" notification from the media element.
    /// Ticks are applied in arrival order; backward movement (a seek) is
    /// reflected immediately, not ignored.
    pub fn on_time_update(&mut self, current_seconds: f64, duration_seconds: f64) -> PlaybackSnapshot {
        self.current_seconds = current_seconds;
        self.duration_seconds = duration_seconds;
        self.snapshot()
    }

    /// Explicit seek (progress-bar drag, agenda-item click). The clock is
    /// updated immediately so the next derivation reflects the jump
    /// without waiting for the next natural tick. Returns the applied,
    /// clamped position.
    pub fn seek_to(&mut self, target_seconds: f64) -> f64 {
        self.current_seconds = target_seconds.clamp(0.0, self.duration_seconds);
        self.current_seconds
    }

    /// Relative jump (the ±10s transport buttons), clamped to the media.
    pub fn skip(&mut self, delta_seconds: f64) -> f64 {
        self.seek_to(self.current_seconds + delta_seconds)
    }

    /// Recompute all derived state from (lists, current position) alone.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        let agenda = (0..self.agenda.len())
            .map(|i| AgendaItemState {
                id: self.agenda[i].id,
                status: agenda_progress::status_of(&self.agenda, i, self.current_seconds),
                progress: agenda_progress::progress_of(&self.agenda, i, self.current_seconds),
            })
            .collect();

        let progress_percent = if self.duration_seconds > 0.0 {
            ((self.current_seconds / self.duration_seconds) * 100.0) as f32
        } else {
            0.0
        };

        PlaybackSnapshot {
            current_seconds: self.current_seconds,
            duration_seconds: self.duration_seconds,
            active_segment: time_index::find_active_segment(&self.segments, self.current_seconds),
            agenda,
            time_display: format!(
                "{} / {}",
                time_index::format_seconds(self.current_seconds as u64),
                time_index::format_seconds(self.duration_seconds as u64)
            ),
            progress_percent,
        }
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}
