//! Shared primitive IDs, answer keys, and record bounds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable question identifier, unique within one store.
pub type QuestionId = i64;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;
/// Fewest hashtags a record may carry.
pub const MIN_HASHTAGS: usize = 5;
/// Most hashtags a record may carry.
pub const MAX_HASHTAGS: usize = 20;

/// Letter naming the correct option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerKey {
    /// First option.
    A,
    /// Second option.
    B,
    /// Third option.
    C,
    /// Fourth option.
    D,
}

impl AnswerKey {
    /// All keys in option order.
    pub const ALL: [AnswerKey; OPTION_COUNT] = [AnswerKey::A, AnswerKey::B, AnswerKey::C, AnswerKey::D];

    /// Parses the single-letter form used in question files.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }

    /// Zero-based position in the options array.
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    /// Letter form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
