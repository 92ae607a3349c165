//! Keyword-based English/Korean emotion classifier.
//!
//! Runs fully offline. Good enough for local play and tests; deployments
//! that need accuracy should point the `http` backend at a real model.

use async_trait::async_trait;
use emoquest_core::{Classification, ClassifierError, Emotion, EmotionClassifier};

const JOY: &[&str] = &[
    "happy", "glad", "joy", "great", "awesome", "love", "excited", "wonderful", "yay", "thank",
    "기뻐", "기쁘", "행복", "좋아", "신나", "최고", "감사", "😊", "😄", "❤️",
];

const SADNESS: &[&str] = &[
    "sad", "cry", "lonely", "miss", "depressed", "unhappy", "tears", "heartbroken", "grief",
    "슬퍼", "슬프", "우울", "외로", "눈물", "보고 싶", "😢", "😭", "💔",
];

const FEAR: &[&str] = &[
    "afraid", "scared", "fear", "anxious", "nervous", "worried", "panic", "terrified",
    "무서", "불안", "걱정", "두려", "긴장", "😨", "😰",
];

const ANGER: &[&str] = &[
    "angry", "furious", "hate", "annoyed", "rage", "mad at", "irritated", "pissed",
    "화나", "화가", "짜증", "열받", "분노", "싫어", "😡", "🤬",
];

/// Score reported when no keyword matches.
const NEUTRAL_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Pick the emotion with the most keyword hits.
    ///
    /// Ties go to the earlier lexicon (joy, sadness, fear, anger). Confidence
    /// grows with the winner's share of all hits and stays below 1.0.
    pub fn score(text: &str) -> (Emotion, f64) {
        let lowered = text.to_lowercase();
        let lexicons = [
            (Emotion::Joy, JOY),
            (Emotion::Sadness, SADNESS),
            (Emotion::Fear, FEAR),
            (Emotion::Anger, ANGER),
        ];

        let counts: Vec<(Emotion, usize)> = lexicons
            .into_iter()
            .map(|(emotion, words)| {
                let hits = words.iter().filter(|w| lowered.contains(*w)).count();
                (emotion, hits)
            })
            .collect();
        let total: usize = counts.iter().map(|(_, n)| n).sum();

        let mut best: Option<(Emotion, usize)> = None;
        for (emotion, hits) in counts {
            if hits > best.as_ref().map(|(_, n)| *n).unwrap_or(0) {
                best = Some((emotion, hits));
            }
        }

        match best {
            Some((emotion, hits)) => {
                let score = 0.5 + 0.5 * hits as f64 / (total as f64 + 1.0);
                (emotion, score.min(0.99))
            }
            None => (Emotion::Neutral, NEUTRAL_SCORE),
        }
    }
}

#[async_trait]
impl EmotionClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::EmptyInput);
        }
        let (emotion, score) = Self::score(text);
        Ok(Classification {
            label: emotion.label().to_string(),
            score,
        })
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
