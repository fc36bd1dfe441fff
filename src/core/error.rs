//! Errors raised while validating or resolving a state snapshot.

use std::fmt;
use thiserror::Error;

/// Which registry an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Scale,
    Fact,
    Boundary,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scale => "scale",
            Self::Fact => "fact",
            Self::Boundary => "boundary",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("value {value} for '{id}' is outside {min}..={max}")]
    OutOfRange {
        id: String,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("unknown {kind} id: {id}")]
    UnknownId { kind: IdKind, id: String },
    #[error("snapshot has no value for {kind} '{id}'")]
    IncompleteSnapshot { kind: IdKind, id: String },
    #[error("fact '{fact}' has no text for state '{state}'")]
    UnknownState { fact: String, state: String },
    #[error("fact '{fact}' expects a {expected} value")]
    KindMismatch { fact: String, expected: &'static str },
    #[error("fact '{fact}' was given '{supplied}' but the snapshot implies '{derived}'")]
    DerivedMismatch {
        fact: String,
        supplied: String,
        derived: String,
    },
}

impl StateError {
    pub(crate) fn unknown(kind: IdKind, id: &str) -> Self {
        Self::UnknownId {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn incomplete(kind: IdKind, id: &str) -> Self {
        Self::IncompleteSnapshot {
            kind,
            id: id.to_string(),
        }
    }
}
