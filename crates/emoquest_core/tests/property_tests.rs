//! Property-based tests for emoquest_core.
//!
//! Progression and history-view rules must hold for every sequence of
//! emotions and every log length, not just the hand-picked cases.

use proptest::prelude::*;
use emoquest_core::history::HistoryViewBuilder;
use emoquest_core::progress::advance;
use emoquest_core::{level_for, Emotion, HistoryEntry, HistoryView, ProgressRecord};

// ============================================================================
// Strategies
// ============================================================================

/// Any label the classifier might emit: the five known ones or junk.
fn arb_emotion() -> impl Strategy<Value = Emotion> {
    prop_oneof![
        Just(Emotion::Joy),
        Just(Emotion::Sadness),
        Just(Emotion::Fear),
        Just(Emotion::Anger),
        Just(Emotion::Neutral),
        "[a-z]{0,12}".prop_map(|s| Emotion::from_label(&s)),
    ]
}

fn arb_entry() -> impl Strategy<Value = HistoryEntry> {
    (arb_emotion(), proptest::option::of(1u32..50), 0.0f64..=1.0).prop_map(|(emotion, level, confidence)| {
        HistoryEntry {
            timestamp: "2024-01-01 00:00:00".to_string(),
            text: String::new(),
            emotion: emotion.label().to_string(),
            confidence,
            level_after: level,
        }
    })
}

// ============================================================================
// Progression
// ============================================================================

proptest! {
    /// **Core invariant**: starting from a fresh record, the persisted level
    /// always equals floor(exp / 100) + 1 and experience never decreases.
    #[test]
    fn level_invariant_and_monotonic_exp(emotions in proptest::collection::vec(arb_emotion(), 1..300)) {
        let mut record: Option<ProgressRecord> = None;
        for emotion in &emotions {
            let before = record.as_ref().map(|r| r.experience).unwrap_or(0);
            let (next, outcome) = advance(record.as_ref(), "user", emotion);
            prop_assert!(next.experience >= before);
            prop_assert_eq!(next.level, level_for(next.experience));
            prop_assert_eq!(outcome.total_exp, next.experience);
            record = Some(next);
        }
    }

    /// Reported gain always matches the catalog and the total moves by exactly that gain.
    #[test]
    fn gain_is_exact(start in 0u32..100_000, emotion in arb_emotion()) {
        let mut prev = ProgressRecord::new("user");
        prev.experience = start;
        prev.level = level_for(start);
        let (next, outcome) = advance(Some(&prev), "user", &emotion);
        prop_assert_eq!(next.experience, start + outcome.exp_gain);
        prop_assert!(outcome.exp_gain <= 7);
        prop_assert_eq!(outcome.exp_gain == 0, !emotion.is_known());
    }

    /// Trend code is total: known labels map into 0..=4, everything else to -1.
    #[test]
    fn trend_code_is_total(label in ".{0,20}") {
        let emotion = Emotion::from_label(&label);
        let code = emotion.trend_code();
        if emotion.is_known() {
            prop_assert!((0..=4).contains(&code));
        } else {
            prop_assert_eq!(code, -1);
        }
    }
}

// ============================================================================
// History view
// ============================================================================

proptest! {
    /// Gate at 10, window of 15, oldest first, and the view is the tail of the log.
    #[test]
    fn view_window_is_tail_of_log(log in proptest::collection::vec(arb_entry(), 0..60)) {
        let view = HistoryViewBuilder::default().build(&log);
        if log.len() < 10 {
            prop_assert_eq!(view, HistoryView::Blocked);
        } else {
            match view {
                HistoryView::Trend(points) => {
                    let expected = log.len().min(15);
                    prop_assert_eq!(points.len(), expected);
                    let tail = &log[log.len() - expected..];
                    for (point, entry) in points.iter().zip(tail) {
                        prop_assert_eq!(point.level, entry.level_after.unwrap_or(1));
                        prop_assert_eq!(point.emotion_code, Emotion::trend_code_for_label(&entry.emotion));
                    }
                }
                HistoryView::Blocked => prop_assert!(false, "unexpected block for {} entries", log.len()),
            }
        }
    }
}
