//! The composed operations exposed to the presentation layer.
//!
//! classify → reward lookup → progression update → log appends → payload.
//! Collaborators are injected; the engine owns no global state.

use crate::classifier::EmotionClassifier;
use crate::emotion::Emotion;
use crate::error::{ClassifierError, QuestError};
use crate::history::{now_timestamp, round_confidence, HistoryView, HistoryViewBuilder, QuestLedgerEntry};
use crate::progress::{ProgressOutcome, ProgressRecord};
use crate::store::{ClassificationEvent, HistoryLog, ProgressStore, QuestLedger, QuestStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Link placeholder rendered when a bundle has no link.
const EMPTY_LINK: &str = "#";

/// JSON payload returned for one analyzed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub emotion: String,
    pub confidence: f64,
    pub message: String,
    pub content: String,
    pub character: String,
    pub quest: String,
    pub link_game: String,
    pub link_mv: String,
    pub exp_gain: u32,
    pub level: u32,
    pub total_exp: u32,
}

impl AnalyzeResponse {
    fn new(emotion: &Emotion, confidence: f64, outcome: &ProgressOutcome) -> Self {
        let reward = &outcome.reward;
        let link = |l: &str| if l.is_empty() { EMPTY_LINK.to_string() } else { l.to_string() };
        Self {
            emotion: emotion.label().to_string(),
            confidence,
            message: reward.message.to_string(),
            content: reward.content.to_string(),
            character: reward.character.to_string(),
            quest: reward.quest.to_string(),
            link_game: link(reward.link_game),
            link_mv: link(reward.link_mv),
            exp_gain: outcome.exp_gain,
            level: outcome.new_level,
            total_exp: outcome.total_exp,
        }
    }
}

pub struct QuestEngine {
    classifier: Arc<dyn EmotionClassifier>,
    store: Arc<dyn QuestStore>,
    view_builder: HistoryViewBuilder,
}

impl QuestEngine {
    pub fn new(classifier: Arc<dyn EmotionClassifier>, store: Arc<dyn QuestStore>) -> Self {
        Self {
            classifier,
            store,
            view_builder: HistoryViewBuilder::default(),
        }
    }

    pub fn with_view_builder(mut self, view_builder: HistoryViewBuilder) -> Self {
        self.view_builder = view_builder;
        self
    }

    pub fn store(&self) -> Arc<dyn QuestStore> {
        self.store.clone()
    }

    /// Classify `text` for `username` and commit the resulting progression.
    ///
    /// Classification happens before any write, so a classifier failure
    /// leaves persisted state untouched.
    pub async fn handle_analyze(&self, username: &str, text: &str) -> Result<AnalyzeResponse, QuestError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::EmptyInput.into());
        }

        let classification = self.classifier.classify(text).await.map_err(|e| {
            tracing::warn!("Classifier '{}' failed for {}: {}", self.classifier.name(), username, e);
            e
        })?;
        if classification.label.trim().is_empty() {
            return Err(ClassifierError::NoLabel.into());
        }

        let emotion = Emotion::from_label(&classification.label);
        let confidence = round_confidence(classification.score);
        tracing::trace!("Classified text for {}: {:?}", username, text);
        tracing::info!("Classified {} as {} ({:.3})", username, emotion, confidence);
        if !emotion.is_known() {
            tracing::debug!("Label '{}' has no reward bundle, granting 0 exp", emotion);
        }

        let event = ClassificationEvent {
            username: username.to_string(),
            text: text.to_string(),
            emotion: emotion.clone(),
            confidence,
            timestamp: now_timestamp(),
        };
        let outcome = self.store.commit_event(&event).await?;

        if outcome.leveled_up {
            tracing::info!("{} reached level {}", username, outcome.new_level);
        }
        tracing::debug!(
            "{}: +{} exp, total {}, level {}",
            username,
            outcome.exp_gain,
            outcome.total_exp,
            outcome.new_level
        );

        Ok(AnalyzeResponse::new(&emotion, confidence, &outcome))
    }

    /// Trend view over the user's recent History Log. Read-only.
    pub async fn handle_history_view(&self, username: &str) -> Result<HistoryView, QuestError> {
        let entries = self.store.read_history(username).await?;
        Ok(self.view_builder.build(&entries))
    }

    /// Current progression, `None` if the user has none yet.
    pub async fn status(&self, username: &str) -> Result<Option<ProgressRecord>, QuestError> {
        Ok(self.store.load_progress(username).await?)
    }

    pub async fn quest_history(&self, username: &str) -> Result<Vec<QuestLedgerEntry>, QuestError> {
        Ok(self.store.read_quests(username).await?)
    }

    /// Hook for account creation: ensures a zeroed progress record exists.
    pub async fn init_user(&self, username: &str) -> Result<ProgressRecord, QuestError> {
        let record = self.store.init_progress(username).await?;
        tracing::debug!("Progress initialised for {}", username);
        Ok(record)
    }
}
