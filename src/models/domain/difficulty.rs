use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Block order of a generation schedule.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired number of questions per difficulty. Counts are weights: they are
/// rescaled when they do not add up to the requested total. Negative weights
/// count as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct DifficultyMix {
    #[serde(default)]
    #[validate(range(max = 1000))]
    pub easy: i64,
    #[serde(default)]
    #[validate(range(max = 1000))]
    pub medium: i64,
    #[serde(default)]
    #[validate(range(max = 1000))]
    pub hard: i64,
}

impl DifficultyMix {
    pub const fn new(easy: i64, medium: i64, hard: i64) -> Self {
        Self { easy, medium, hard }
    }

    /// A mix where every question uses the same difficulty.
    pub fn only(difficulty: Difficulty) -> Self {
        let mut counts = [0; 3];
        counts[difficulty.index()] = 1;
        Self::new(counts[0], counts[1], counts[2])
    }

    pub fn count(&self, difficulty: Difficulty) -> i64 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}
