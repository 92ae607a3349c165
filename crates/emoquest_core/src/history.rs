//! History Log / Quest Ledger entries and the trend view built from them.

use crate::emotion::Emotion;
use serde::{Deserialize, Serialize};

/// Entries required before a trend view is shown.
pub const MIN_HISTORY_ENTRIES: usize = 10;
/// Most recent entries included in a trend view.
pub const HISTORY_WINDOW: usize = 15;
/// Wall-clock format shared by both logs (second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in `TIMESTAMP_FORMAT`.
pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Round a classifier score to 3 decimal places.
pub fn round_confidence(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

/// One classification event in a user's History Log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    /// Raw user input, stored as given.
    pub text: String,
    pub emotion: String,
    pub confidence: f64,
    /// Level after the event. `None` only for rows written without one.
    pub level_after: Option<u32>,
}

impl HistoryEntry {
    pub fn new(timestamp: &str, text: &str, emotion: &Emotion, confidence: f64, level_after: u32) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            text: text.to_string(),
            emotion: emotion.label().to_string(),
            confidence: round_confidence(confidence),
            level_after: Some(level_after),
        }
    }
}

/// One awarded quest in the Quest Ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestLedgerEntry {
    pub username: String,
    pub emotion: String,
    pub quest: String,
    pub timestamp: String,
}

/// A single point on the trend chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub time: String,
    pub emotion_code: i32,
    pub level: u32,
}

/// Result of building the trend view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "history", rename_all = "snake_case")]
pub enum HistoryView {
    /// Not enough entries yet to draw a trend.
    Blocked,
    /// Oldest-first window of recent entries.
    Trend(Vec<TrendPoint>),
}

impl HistoryView {
    pub fn is_blocked(&self) -> bool {
        matches!(self, HistoryView::Blocked)
    }
}

/// Builds the gated, bounded trend view from a full History Log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryViewBuilder {
    min_entries: usize,
    window: usize,
}

impl Default for HistoryViewBuilder {
    fn default() -> Self {
        Self {
            min_entries: MIN_HISTORY_ENTRIES,
            window: HISTORY_WINDOW,
        }
    }
}

impl HistoryViewBuilder {
    pub fn new(min_entries: usize, window: usize) -> Self {
        Self { min_entries, window }
    }

    pub fn min_entries(&self) -> usize {
        self.min_entries
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// `entries` must be in insertion order. An empty slice stands for a log
    /// that was never created.
    pub fn build(&self, entries: &[HistoryEntry]) -> HistoryView {
        if entries.len() < self.min_entries {
            tracing::debug!(
                "History view blocked: {} entries (need {})",
                entries.len(),
                self.min_entries
            );
            return HistoryView::Blocked;
        }

        let start = entries.len().saturating_sub(self.window);
        let points = entries[start..]
            .iter()
            .map(|entry| TrendPoint {
                time: entry.timestamp.clone(),
                emotion_code: Emotion::trend_code_for_label(&entry.emotion),
                level: entry.level_after.unwrap_or(1),
            })
            .collect();
        HistoryView::Trend(points)
    }
}
