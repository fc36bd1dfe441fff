//! Fact/flag registry and the catalog of named boundaries.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

use crate::core::error::{IdKind, StateError};
use crate::schema::fact::{Fact, FactKind, FactSource, FactValue};

/// Placeholder a boundary fallback template substitutes.
pub const BOUNDARY_PLACEHOLDER: &str = "{boundary}";

/// Facts in declaration order, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct FactRegistry {
    facts: Vec<Fact>,
    index: FxHashMap<String, usize>,
}

impl FactRegistry {
    pub(crate) fn new(facts: Vec<Fact>) -> Self {
        let index = facts
            .iter()
            .enumerate()
            .map(|(i, fact)| (fact.id.clone(), i))
            .collect();
        Self { facts, index }
    }

    pub fn get(&self, id: &str) -> Option<&Fact> {
        self.index.get(id).map(|&i| &self.facts[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Sentence for `value` on fact `id`.
    ///
    /// An empty string means "omit this fact", which is not an error. A
    /// bucket state without an entry fails with `UnknownState`.
    pub fn resolve(&self, id: &str, value: &FactValue) -> Result<&str, StateError> {
        let fact = self
            .get(id)
            .ok_or_else(|| StateError::unknown(IdKind::Fact, id))?;

        match (&fact.kind, value) {
            (FactKind::Flag { on, .. }, FactValue::Flag(true)) => Ok(on.as_str()),
            (FactKind::Flag { off, .. }, FactValue::Flag(false)) => Ok(off.as_str()),
            (FactKind::Buckets(states), FactValue::State(state)) => states
                .get(state)
                .map(String::as_str)
                .ok_or_else(|| StateError::UnknownState {
                    fact: fact.id.clone(),
                    state: state.clone(),
                }),
            (kind, _) => Err(StateError::KindMismatch {
                fact: fact.id.clone(),
                expected: kind.name(),
            }),
        }
    }
}

/// Pick the bucket state for an integer count.
///
/// An exactly-named state wins; otherwise the floor bucket `N+` with the
/// largest `N <= count`.
pub fn bucket_for_count(states: &BTreeMap<String, String>, count: i64) -> Option<&str> {
    let exact = count.to_string();
    if let Some((state, _)) = states.get_key_value(&exact) {
        return Some(state.as_str());
    }

    states
        .keys()
        .filter_map(|state| {
            let floor: i64 = state.strip_suffix('+')?.trim().parse().ok()?;
            (floor <= count).then_some((floor, state.as_str()))
        })
        .max_by_key(|(floor, _)| *floor)
        .map(|(_, state)| state)
}

/// Final value of `fact` for a snapshot carrying `supplied` and
/// `boundary_count` distinct boundaries.
///
/// Plain facts keep the supplied value. A fact derived from boundaries keeps
/// the supplied value only when no boundaries are named; otherwise its value
/// is the bucket for the count, and a supplied value must agree with it.
pub fn settle_value(
    fact: &Fact,
    supplied: Option<&FactValue>,
    boundary_count: usize,
) -> Result<Option<FactValue>, StateError> {
    match fact.derived_from {
        None => Ok(supplied.cloned()),
        Some(FactSource::Boundaries) if boundary_count == 0 => Ok(supplied.cloned()),
        Some(FactSource::Boundaries) => {
            let FactKind::Buckets(states) = &fact.kind else {
                return Err(StateError::KindMismatch {
                    fact: fact.id.clone(),
                    expected: "bucket",
                });
            };
            let count = i64::try_from(boundary_count).unwrap_or(i64::MAX);
            let derived = bucket_for_count(states, count)
                .map(FactValue::from)
                .ok_or_else(|| StateError::UnknownState {
                    fact: fact.id.clone(),
                    state: count.to_string(),
                })?;
            match supplied {
                Some(value) if *value != derived => Err(StateError::DerivedMismatch {
                    fact: fact.id.clone(),
                    supplied: value.to_string(),
                    derived: derived.to_string(),
                }),
                _ => Ok(Some(derived)),
            }
        }
    }
}

/// Named boundaries the player can set, with an optional template for
/// names the catalog does not know.
#[derive(Debug, Clone, Default)]
pub struct BoundaryCatalog {
    known: FxHashMap<String, String>,
    fallback: Option<String>,
}

impl BoundaryCatalog {
    /// `known` keys must already be normalized and any fallback must carry
    /// the placeholder; the registry loader checks both.
    pub(crate) fn new(known: FxHashMap<String, String>, fallback: Option<String>) -> Self {
        Self { known, fallback }
    }

    /// A boundary name as it reads in context: trimmed, with inner runs of
    /// whitespace (line breaks included) collapsed to one space.
    pub fn display_name(name: &str) -> String {
        name.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Lookup key for a boundary name: display form, lowercased.
    pub fn normalize(name: &str) -> String {
        Self::display_name(name).to_lowercase()
    }

    /// First spelling of each distinct non-blank name, in input order.
    pub fn distinct(names: &[String]) -> Vec<String> {
        let mut seen = FxHashSet::default();
        names
            .iter()
            .map(|name| Self::display_name(name))
            .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn resolve(&self, name: &str) -> Result<String, StateError> {
        if let Some(text) = self.known.get(&Self::normalize(name)) {
            return Ok(text.clone());
        }
        let name = Self::display_name(name);
        match &self.fallback {
            Some(template) => Ok(template.replace(BOUNDARY_PLACEHOLDER, &name)),
            None => Err(StateError::unknown(IdKind::Boundary, &name)),
        }
    }
}
