//! Validator: turns raw caller input into a snapshot the composer accepts.
//!
//! This is the only place a value is repaired, and only where a scale
//! declares `Clamp`. Everything else fails unchanged.

use std::collections::BTreeMap;

use crate::core::error::{IdKind, StateError};
use crate::core::facts::{bucket_for_count, settle_value, BoundaryCatalog};
use crate::core::registry::Registry;
use crate::schema::fact::{AbsentPolicy, Fact, FactKind, FactValue};
use crate::schema::scale::RangePolicy;
use crate::schema::snapshot::{RawFactValue, RawState, StateSnapshot};

/// Applies each definition's declared policy to raw input.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    registry: &'a Registry,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Check, clamp where declared, and type every value in `raw`.
    pub fn normalize(&self, raw: &RawState) -> Result<StateSnapshot, StateError> {
        let scales = self.normalize_scales(&raw.scales)?;
        let boundaries = self.normalize_boundaries(&raw.boundaries)?;
        Ok(StateSnapshot {
            scales,
            facts: self.normalize_facts(&raw.facts, boundaries.len())?,
            lessons: raw
                .lessons
                .iter()
                .map(|&index| self.registry.lessons().check_index(index))
                .collect::<Result<_, _>>()?,
            boundaries,
        })
    }

    /// Reject snapshot ids the registry does not declare.
    pub fn check_ids(&self, snapshot: &StateSnapshot) -> Result<(), StateError> {
        if let Some(id) = snapshot
            .scales
            .keys()
            .find(|id| !self.registry.scales().contains(id))
        {
            return Err(StateError::unknown(IdKind::Scale, id));
        }
        if let Some(id) = snapshot
            .facts
            .keys()
            .find(|id| !self.registry.facts().contains(id))
        {
            return Err(StateError::unknown(IdKind::Fact, id));
        }
        Ok(())
    }

    fn normalize_scales(
        &self,
        raw: &BTreeMap<String, i64>,
    ) -> Result<BTreeMap<String, i64>, StateError> {
        if let Some(id) = raw.keys().find(|id| !self.registry.scales().contains(id)) {
            return Err(StateError::unknown(IdKind::Scale, id));
        }

        let mut scales = BTreeMap::new();
        for scale in self.registry.scales().iter() {
            let value = *raw
                .get(&scale.id)
                .ok_or_else(|| StateError::incomplete(IdKind::Scale, &scale.id))?;

            let value = if scale.contains(value) {
                value
            } else {
                match scale.out_of_range {
                    RangePolicy::Clamp => {
                        let clamped = scale.clamp(value);
                        tracing::warn!(
                            scale = %scale.id,
                            value,
                            clamped,
                            "Clamped out-of-range scale value"
                        );
                        clamped
                    }
                    RangePolicy::Reject => {
                        return Err(StateError::OutOfRange {
                            id: scale.id.clone(),
                            value,
                            min: scale.min,
                            max: scale.max,
                        });
                    }
                }
            };
            scales.insert(scale.id.clone(), value);
        }
        Ok(scales)
    }

    fn normalize_facts(
        &self,
        raw: &BTreeMap<String, RawFactValue>,
        boundary_count: usize,
    ) -> Result<BTreeMap<String, FactValue>, StateError> {
        if let Some(id) = raw.keys().find(|id| !self.registry.facts().contains(id)) {
            return Err(StateError::unknown(IdKind::Fact, id));
        }

        let mut facts = BTreeMap::new();
        for fact in self.registry.facts().iter() {
            let supplied = raw
                .get(&fact.id)
                .map(|value| fact_value(fact, value))
                .transpose()?;
            match settle_value(fact, supplied.as_ref(), boundary_count)? {
                Some(value) => {
                    facts.insert(fact.id.clone(), value);
                }
                None if fact.when_absent == AbsentPolicy::Required => {
                    return Err(StateError::incomplete(IdKind::Fact, &fact.id));
                }
                None => {}
            }
        }
        Ok(facts)
    }

    /// Blank names and repeats are dropped; known names and the fallback
    /// both resolve, anything else is an unknown boundary.
    fn normalize_boundaries(&self, raw: &[String]) -> Result<Vec<String>, StateError> {
        let boundaries = BoundaryCatalog::distinct(raw);
        for name in &boundaries {
            self.registry.boundaries().resolve(name)?;
        }
        Ok(boundaries)
    }
}

fn fact_value(fact: &Fact, raw: &RawFactValue) -> Result<FactValue, StateError> {
    let unknown_state = |state: String| StateError::UnknownState {
        fact: fact.id.clone(),
        state,
    };

    match (&fact.kind, raw) {
        (FactKind::Flag { .. }, RawFactValue::Flag(flag)) => Ok(FactValue::Flag(*flag)),
        (FactKind::Buckets(states), RawFactValue::State(state)) => {
            if states.contains_key(state) {
                Ok(FactValue::State(state.clone()))
            } else {
                Err(unknown_state(state.clone()))
            }
        }
        (FactKind::Buckets(states), RawFactValue::Count(count)) => bucket_for_count(states, *count)
            .map(|state| FactValue::State(state.to_string()))
            .ok_or_else(|| unknown_state(count.to_string())),
        (kind, _) => Err(StateError::KindMismatch {
            fact: fact.id.clone(),
            expected: kind.name(),
        }),
    }
}
