//! Experience and level arithmetic for a single user.

use crate::emotion::Emotion;
use crate::reward::{RewardBundle, RewardCatalog};
use serde::{Deserialize, Serialize};

/// Experience needed to advance one level.
pub const EXP_PER_LEVEL: u32 = 100;

/// Level derived from total experience: `floor(exp / 100) + 1`.
pub fn level_for(experience: u32) -> u32 {
    experience / EXP_PER_LEVEL + 1
}

/// Persisted progression state, one per username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub username: String,
    pub experience: u32,
    pub level: u32,
    pub last_quest: String,
    pub last_emotion: String,
}

impl ProgressRecord {
    /// Fresh record as created at signup.
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            experience: 0,
            level: 1,
            last_quest: String::new(),
            last_emotion: String::new(),
        }
    }
}

/// What one emotion did to a user's progression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressOutcome {
    pub exp_gain: u32,
    /// Reported level. Always 1 when the record was just created.
    pub new_level: u32,
    pub total_exp: u32,
    pub reward: RewardBundle,
    /// True when no record existed before this update.
    pub created: bool,
    pub leveled_up: bool,
}

/// Apply one classified emotion to the current record (if any).
///
/// Returns the record to persist and the values to report. A missing record
/// is created with the gain as its experience and level 1, even when the gain
/// alone would derive a higher level; existing records always re-derive their
/// level from the new total.
pub fn advance(
    current: Option<&ProgressRecord>,
    username: &str,
    emotion: &Emotion,
) -> (ProgressRecord, ProgressOutcome) {
    let reward = RewardCatalog::lookup(emotion);
    let exp_gain = reward.experience;

    match current {
        None => {
            let record = ProgressRecord {
                username: username.to_string(),
                experience: exp_gain,
                level: 1,
                last_quest: reward.quest.to_string(),
                last_emotion: emotion.label().to_string(),
            };
            let outcome = ProgressOutcome {
                exp_gain,
                new_level: 1,
                total_exp: exp_gain,
                reward,
                created: true,
                leveled_up: false,
            };
            (record, outcome)
        }
        Some(prev) => {
            let total_exp = prev.experience.saturating_add(exp_gain);
            let new_level = level_for(total_exp);
            let record = ProgressRecord {
                username: prev.username.clone(),
                experience: total_exp,
                level: new_level,
                last_quest: reward.quest.to_string(),
                last_emotion: emotion.label().to_string(),
            };
            let outcome = ProgressOutcome {
                exp_gain,
                new_level,
                total_exp,
                reward,
                created: false,
                leveled_up: new_level > prev.level,
            };
            (record, outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_boundaries() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(99), 1);
        assert_eq!(level_for(100), 2);
        assert_eq!(level_for(250), 3);
    }

    #[test]
    fn test_first_joy_creates_record() {
        let (record, outcome) = advance(None, "alice", &Emotion::Joy);
        assert_eq!(outcome.exp_gain, 5);
        assert_eq!(outcome.total_exp, 5);
        assert_eq!(outcome.new_level, 1);
        assert!(outcome.created);
        assert_eq!(record.experience, 5);
        assert_eq!(record.level, 1);
        assert_eq!(record.last_quest, "컬러링 게임");
        assert_eq!(record.last_emotion, "joy");
    }

    #[test]
    fn test_existing_record_crosses_level() {
        let mut prev = ProgressRecord::new("bob");
        prev.experience = 97;
        let (record, outcome) = advance(Some(&prev), "bob", &Emotion::Anger);
        assert_eq!(outcome.total_exp, 104);
        assert_eq!(outcome.new_level, 2);
        assert!(outcome.leveled_up);
        assert!(!outcome.created);
        assert_eq!(record.level, 2);
        assert_eq!(record.last_quest, "댄스 챌린지");
    }

    #[test]
    fn test_unknown_emotion_gains_nothing() {
        let mut prev = ProgressRecord::new("carol");
        prev.experience = 42;
        let (record, outcome) = advance(Some(&prev), "carol", &Emotion::from_label("surprise"));
        assert_eq!(outcome.exp_gain, 0);
        assert_eq!(record.experience, 42);
        assert_eq!(record.last_quest, "");
        assert_eq!(record.last_emotion, "surprise");
    }

    #[test]
    fn test_experience_saturates() {
        let mut prev = ProgressRecord::new("dave");
        prev.experience = u32::MAX - 1;
        let (record, _) = advance(Some(&prev), "dave", &Emotion::Joy);
        assert_eq!(record.experience, u32::MAX);
    }
}
