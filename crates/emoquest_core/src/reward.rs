//! Static reward catalog: what a user receives for each classified emotion.

use crate::emotion::Emotion;
use serde::Serialize;

/// Content bundle attached to one emotion.
///
/// All fields are compile-time constants; an unknown emotion maps to
/// `RewardBundle::default()` (empty strings, zero experience).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewardBundle {
    pub message: &'static str,
    /// Media reference shown alongside the message.
    pub content: &'static str,
    pub character: &'static str,
    pub quest: &'static str,
    pub link_game: &'static str,
    pub link_mv: &'static str,
    pub experience: u32,
}

impl RewardBundle {
    pub fn is_empty(&self) -> bool {
        *self == RewardBundle::default()
    }
}

const JOY: RewardBundle = RewardBundle {
    message: "기쁜 하루였군요! 잘하셨어요 😊",
    content: "joy_image.jpg",
    character: "아이유",
    quest: "컬러링 게임",
    link_game: "https://www.tinytap.com/activities/g4wub/play/feeling-happy",
    link_mv: "https://www.youtube.com/watch?v=0-q1KafFCLU",
    experience: 5,
};

const SADNESS: RewardBundle = RewardBundle {
    message: "슬픈 하루였나요? 괜찮아요, 함께 이겨내요! 💧",
    content: "sadness_music.mp3",
    character: "테일러 스위프트",
    quest: "감정을 표현하는 게임과 음악",
    link_game: "https://www.tinytap.com/activities/g3ctu/play/emotions-sad",
    link_mv: "https://www.youtube.com/watch?v=q3zqJs7JUCQ",
    experience: 4,
};

const FEAR: RewardBundle = RewardBundle {
    message: "불안하셨군요. 호흡을 가다듬어볼까요? 🌬️",
    content: "breathing_exercise.mp4",
    character: "아이유",
    quest: "불안 관리 인터랙티브 콘텐츠",
    link_game: "https://ncase.me/anxiety/",
    link_mv: "https://www.youtube.com/watch?v=0-q1KafFCLU",
    experience: 6,
};

const ANGER: RewardBundle = RewardBundle {
    message: "화가 나셨군요. 진정하는 시간이 필요해요 🔥",
    content: "calm_video.mp4",
    character: "세븐틴",
    quest: "댄스 챌린지",
    link_game: "https://www.tinytap.com/activities/g5i6d/play/anger-go-away-practicing-self-management",
    link_mv: "https://www.youtube.com/watch?v=-GQg25oP0S4",
    experience: 7,
};

const NEUTRAL: RewardBundle = RewardBundle {
    message: "잔잔한 하루네요. 평온한 시간 되세요 🌿",
    content: "neutral_background.png",
    character: "세븐틴",
    quest: "감정 퀴즈",
    link_game: "https://pbskids.org/daniel/games/guess-the-feeling",
    link_mv: "https://www.youtube.com/watch?v=-GQg25oP0S4",
    experience: 3,
};

pub struct RewardCatalog;

impl RewardCatalog {
    /// Look up the bundle for an emotion. Never fails: labels outside the
    /// catalog get an empty bundle worth zero experience.
    pub fn lookup(emotion: &Emotion) -> RewardBundle {
        match emotion {
            Emotion::Joy => JOY,
            Emotion::Sadness => SADNESS,
            Emotion::Fear => FEAR,
            Emotion::Anger => ANGER,
            Emotion::Neutral => NEUTRAL,
            Emotion::Other(_) => RewardBundle::default(),
        }
    }

    pub fn lookup_label(label: &str) -> RewardBundle {
        Self::lookup(&Emotion::from_label(label))
    }
}
