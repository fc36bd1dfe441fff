use serde::{Deserialize, Serialize};

use super::transition::Transition;

/// What the validator does with a value outside a scale's declared range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RangePolicy {
    /// Fail the turn with `OutOfRange`.
    #[default]
    Reject,
    /// Pull the value to the nearest bound.
    Clamp,
}

/// An ordinal game-state variable with exactly one sentence per integer
/// level in `min..=max`.
///
/// Only the registry loader builds scales, so the level table is always
/// complete for the declared range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scale {
    pub id: String,
    pub min: i64,
    pub max: i64,
    pub out_of_range: RangePolicy,
    /// Level text indexed by `value - min`.
    levels: Vec<String>,
    pub transitions: Vec<Transition>,
}

impl Scale {
    pub(crate) fn from_parts(
        id: String,
        min: i64,
        max: i64,
        out_of_range: RangePolicy,
        levels: Vec<String>,
        transitions: Vec<Transition>,
    ) -> Self {
        debug_assert_eq!(levels.len() as i64, max - min + 1);
        Self {
            id,
            min,
            max,
            out_of_range,
            levels,
            transitions,
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Nearest in-range value.
    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }

    /// Sentence registered for `value`, or `None` when out of range.
    pub fn level_text(&self, value: i64) -> Option<&str> {
        if !self.contains(value) {
            return None;
        }
        let offset = usize::try_from(value - self.min).ok()?;
        self.levels.get(offset).map(String::as_str)
    }

    /// All `(level, sentence)` pairs in ascending level order.
    pub fn levels(&self) -> impl Iterator<Item = (i64, &str)> {
        (self.min..=self.max).zip(self.levels.iter().map(String::as_str))
    }

    pub fn transition_text(&self, from: i64, to: i64) -> Option<&str> {
        let (from, to) = (from.to_string(), to.to_string());
        self.transitions
            .iter()
            .find(|t| t.matches(&from, &to))
            .map(|t| t.text.as_str())
    }
}
