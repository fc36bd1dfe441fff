use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::fact::FactValue;

/// The validated game state for one turn.
///
/// Owned by the caller and read by the composer. Ordered maps keep
/// serialization and iteration stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub scales: BTreeMap<String, i64>,
    #[serde(default)]
    pub facts: BTreeMap<String, FactValue>,
    /// Unlocked lesson indices, deduplicated and ascending.
    #[serde(default)]
    pub lessons: BTreeSet<u32>,
    /// Named boundaries in the order the player set them.
    #[serde(default)]
    pub boundaries: Vec<String>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, id: &str, value: i64) -> Self {
        self.scales.insert(id.to_string(), value);
        self
    }

    pub fn with_fact(mut self, id: &str, value: impl Into<FactValue>) -> Self {
        self.facts.insert(id.to_string(), value.into());
        self
    }

    pub fn unlock(mut self, index: u32) -> Self {
        self.lessons.insert(index);
        self
    }

    pub fn with_boundary(mut self, name: &str) -> Self {
        self.boundaries.push(name.to_string());
        self
    }
}

/// A raw fact value as the game-state manager sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFactValue {
    Flag(bool),
    Count(i64),
    State(String),
}

/// Unvalidated state input. Every section may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawState {
    #[serde(default)]
    pub scales: BTreeMap<String, i64>,
    #[serde(default)]
    pub facts: BTreeMap<String, RawFactValue>,
    #[serde(default)]
    pub lessons: Vec<i64>,
    #[serde(default)]
    pub boundaries: Vec<String>,
}

impl RawState {
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn from_ron(input: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(input)
    }
}
