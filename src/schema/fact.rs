use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::transition::Transition;

/// The current value of a fact in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Flag(bool),
    State(String),
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => write!(f, "{}", flag),
            Self::State(state) => f.write_str(state),
        }
    }
}

impl From<bool> for FactValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<&str> for FactValue {
    fn from(state: &str) -> Self {
        Self::State(state.to_string())
    }
}

/// How a fact maps its value onto text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactKind {
    /// Boolean fact. An empty `off` text drops the fact from context when false.
    Flag { on: String, off: String },
    /// Small categorical fact. A state named `N+` also catches any integer
    /// count of at least `N` during validation.
    Buckets(BTreeMap<String, String>),
}

impl FactKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flag { .. } => "flag",
            Self::Buckets(_) => "bucket",
        }
    }
}

/// What a snapshot without a value for this fact means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AbsentPolicy {
    /// Missing value is an `IncompleteSnapshot` error.
    #[default]
    Required,
    /// Missing value contributes nothing.
    Omit,
}

/// Other snapshot state a fact's value is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactSource {
    /// Bucket picked by the number of distinct named boundaries.
    Boundaries,
}

/// A boolean or categorical one-shot fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    pub kind: FactKind,
    #[serde(default)]
    pub when_absent: AbsentPolicy,
    #[serde(default)]
    pub derived_from: Option<FactSource>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl Fact {
    /// Whether `value` belongs to this fact's domain.
    pub fn accepts(&self, value: &FactValue) -> bool {
        match (&self.kind, value) {
            (FactKind::Flag { .. }, FactValue::Flag(_)) => true,
            (FactKind::Buckets(states), FactValue::State(state)) => states.contains_key(state),
            _ => false,
        }
    }

    pub fn transition_text(&self, from: &FactValue, to: &FactValue) -> Option<&str> {
        let (from, to) = (from.to_string(), to.to_string());
        self.transitions
            .iter()
            .find(|t| t.matches(&from, &to))
            .map(|t| t.text.as_str())
    }
}
