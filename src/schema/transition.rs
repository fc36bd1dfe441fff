use serde::{Deserialize, Serialize};

/// A bridge sentence for one specific jump of a scale or fact value,
/// e.g. exhaustion going from `2` to `4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub text: String,
}

impl Transition {
    /// Split a `from->to` key into its two trimmed sides.
    ///
    /// Returns `None` when the arrow is missing or either side is empty.
    pub fn split_key(key: &str) -> Option<(&str, &str)> {
        let (from, to) = key.split_once("->")?;
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return None;
        }
        Some((from, to))
    }

    pub fn matches(&self, from: &str, to: &str) -> bool {
        self.from == from && self.to == to
    }
}
