//! Discrete emotion labels produced by the classifier.
//!
//! The classifier is an open-ended black box, so anything outside the five
//! labels the game knows about is carried through as `Other` instead of
//! being rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Emotion {
    Joy,
    Sadness,
    Fear,
    Anger,
    Neutral,
    /// Any label the reward catalog has no entry for (e.g. "surprise").
    Other(String),
}

impl Emotion {
    /// The labels with a populated reward bundle, in trend-code order.
    pub const KNOWN: [Emotion; 5] = [
        Emotion::Neutral,
        Emotion::Sadness,
        Emotion::Fear,
        Emotion::Anger,
        Emotion::Joy,
    ];

    /// Parse a raw classifier label. Matching is case-insensitive and
    /// ignores surrounding whitespace.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "joy" => Emotion::Joy,
            "sadness" => Emotion::Sadness,
            "fear" => Emotion::Fear,
            "anger" => Emotion::Anger,
            "neutral" => Emotion::Neutral,
            _ => Emotion::Other(normalized),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Fear => "fear",
            Emotion::Anger => "anger",
            Emotion::Neutral => "neutral",
            Emotion::Other(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Emotion::Other(_))
    }

    /// Numeric code used on the trend chart. Unknown labels plot as -1.
    pub fn trend_code(&self) -> i32 {
        match self {
            Emotion::Neutral => 0,
            Emotion::Sadness => 1,
            Emotion::Fear => 2,
            Emotion::Anger => 3,
            Emotion::Joy => 4,
            Emotion::Other(_) => -1,
        }
    }

    /// Trend code for a stored History Log label. Only the exact lower-case
    /// label matches; anything else plots as -1.
    pub fn trend_code_for_label(label: &str) -> i32 {
        Self::KNOWN
            .iter()
            .find(|e| e.label() == label)
            .map_or(-1, Emotion::trend_code)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Emotion {
    fn from(label: String) -> Self {
        Emotion::from_label(&label)
    }
}

impl From<&str> for Emotion {
    fn from(label: &str) -> Self {
        Emotion::from_label(label)
    }
}

impl From<Emotion> for String {
    fn from(emotion: Emotion) -> Self {
        emotion.label().to_string()
    }
}
