//! Persistence collaborators and an in-process implementation.
//!
//! Three resources per user: the mutable `ProgressRecord`, the append-only
//! History Log and the append-only Quest Ledger. `commit_event` writes all
//! three for one classification as a single failure-atomic unit.

use crate::emotion::Emotion;
use crate::error::StoreError;
use crate::history::{HistoryEntry, QuestLedgerEntry};
use crate::progress::{advance, ProgressOutcome, ProgressRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// A classified piece of text, ready to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationEvent {
    pub username: String,
    pub text: String,
    pub emotion: Emotion,
    /// Already rounded to 3 decimals.
    pub confidence: f64,
    pub timestamp: String,
}

impl ClassificationEvent {
    /// Log entries produced by this event once its outcome is known.
    pub fn log_entries(&self, outcome: &ProgressOutcome) -> (HistoryEntry, QuestLedgerEntry) {
        let history = HistoryEntry::new(
            &self.timestamp,
            &self.text,
            &self.emotion,
            self.confidence,
            outcome.new_level,
        );
        let quest = QuestLedgerEntry {
            username: self.username.clone(),
            emotion: self.emotion.label().to_string(),
            quest: outcome.reward.quest.to_string(),
            timestamp: self.timestamp.clone(),
        };
        (history, quest)
    }
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn load_progress(&self, username: &str) -> Result<Option<ProgressRecord>, StoreError>;

    /// Create a zeroed record if none exists. Existing records are returned untouched.
    async fn init_progress(&self, username: &str) -> Result<ProgressRecord, StoreError>;

    /// Read-modify-write of one user's record, atomic per user.
    async fn apply_emotion(&self, username: &str, emotion: &Emotion) -> Result<ProgressOutcome, StoreError>;

    /// Progress update plus both log appends, all or nothing.
    async fn commit_event(&self, event: &ClassificationEvent) -> Result<ProgressOutcome, StoreError>;
}

/// Append-only, insertion-ordered per-user History Log.
#[async_trait]
pub trait HistoryLog: Send + Sync {
    async fn append_history(&self, username: &str, entry: &HistoryEntry) -> Result<(), StoreError>;

    /// Oldest first. A log that was never written reads as empty.
    async fn read_history(&self, username: &str) -> Result<Vec<HistoryEntry>, StoreError>;
}

/// Append-only, insertion-ordered Quest Ledger keyed by username.
#[async_trait]
pub trait QuestLedger: Send + Sync {
    async fn append_quest(&self, entry: &QuestLedgerEntry) -> Result<(), StoreError>;

    async fn read_quests(&self, username: &str) -> Result<Vec<QuestLedgerEntry>, StoreError>;
}

pub trait QuestStore: ProgressStore + HistoryLog + QuestLedger {}

impl<T: ProgressStore + HistoryLog + QuestLedger + ?Sized> QuestStore for T {}

#[derive(Default)]
struct MemoryState {
    progress: HashMap<String, ProgressRecord>,
    history: HashMap<String, Vec<HistoryEntry>>,
    quests: Vec<QuestLedgerEntry>,
}

/// Non-durable store. One lock guards everything, so every operation is
/// serialised and `commit_event` is trivially atomic.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for InMemoryStore {
    async fn load_progress(&self, username: &str) -> Result<Option<ProgressRecord>, StoreError> {
        Ok(self.state.lock().await.progress.get(username).cloned())
    }

    async fn init_progress(&self, username: &str) -> Result<ProgressRecord, StoreError> {
        let mut state = self.state.lock().await;
        let record = state
            .progress
            .entry(username.to_string())
            .or_insert_with(|| ProgressRecord::new(username));
        Ok(record.clone())
    }

    async fn apply_emotion(&self, username: &str, emotion: &Emotion) -> Result<ProgressOutcome, StoreError> {
        let mut state = self.state.lock().await;
        let (record, outcome) = advance(state.progress.get(username), username, emotion);
        state.progress.insert(username.to_string(), record);
        Ok(outcome)
    }

    async fn commit_event(&self, event: &ClassificationEvent) -> Result<ProgressOutcome, StoreError> {
        let mut state = self.state.lock().await;
        let (record, outcome) = advance(state.progress.get(&event.username), &event.username, &event.emotion);
        let (history, quest) = event.log_entries(&outcome);

        state.progress.insert(event.username.clone(), record);
        state
            .history
            .entry(event.username.clone())
            .or_default()
            .push(history);
        state.quests.push(quest);
        Ok(outcome)
    }
}

#[async_trait]
impl HistoryLog for InMemoryStore {
    async fn append_history(&self, username: &str, entry: &HistoryEntry) -> Result<(), StoreError> {
        self.state
            .lock()
            .await
            .history
            .entry(username.to_string())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn read_history(&self, username: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .history
            .get(username)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl QuestLedger for InMemoryStore {
    async fn append_quest(&self, entry: &QuestLedgerEntry) -> Result<(), StoreError> {
        self.state.lock().await.quests.push(entry.clone());
        Ok(())
    }

    async fn read_quests(&self, username: &str) -> Result<Vec<QuestLedgerEntry>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .quests
            .iter()
            .filter(|q| q.username == username)
            .cloned()
            .collect())
    }
}
