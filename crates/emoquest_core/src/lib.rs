pub mod classifier;
pub mod config;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod history;
pub mod progress;
pub mod reward;
pub mod store;

pub use classifier::{Classification, EmotionClassifier};
pub use config::EmoquestConfig;
pub use emotion::Emotion;
pub use engine::{AnalyzeResponse, QuestEngine};
pub use error::{ClassifierError, QuestError, StoreError};
pub use history::{HistoryEntry, HistoryView, HistoryViewBuilder, QuestLedgerEntry, TrendPoint};
pub use progress::{level_for, ProgressOutcome, ProgressRecord};
pub use reward::{RewardBundle, RewardCatalog};
pub use store::{ClassificationEvent, HistoryLog, InMemoryStore, ProgressStore, QuestLedger, QuestStore};
