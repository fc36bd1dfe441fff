//! Scale registry: ordinal variables resolved to one sentence per level.

use rustc_hash::FxHashMap;

use crate::core::error::{IdKind, StateError};
use crate::schema::scale::Scale;

/// Scales in declaration order, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct ScaleRegistry {
    scales: Vec<Scale>,
    index: FxHashMap<String, usize>,
}

impl ScaleRegistry {
    /// Build from scales the loader has already checked for unique ids.
    pub(crate) fn new(scales: Vec<Scale>) -> Self {
        let index = scales
            .iter()
            .enumerate()
            .map(|(i, scale)| (scale.id.clone(), i))
            .collect();
        Self { scales, index }
    }

    pub fn get(&self, id: &str) -> Option<&Scale> {
        self.index.get(id).map(|&i| &self.scales[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Scales in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Scale> {
        self.scales.iter()
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    /// Sentence for `value` on scale `id`.
    ///
    /// Never clamps: an out-of-range value fails with `OutOfRange` whatever
    /// the scale's policy, which only the validator applies.
    pub fn resolve(&self, id: &str, value: i64) -> Result<&str, StateError> {
        let scale = self
            .get(id)
            .ok_or_else(|| StateError::unknown(IdKind::Scale, id))?;
        scale.level_text(value).ok_or_else(|| StateError::OutOfRange {
            id: scale.id.clone(),
            value,
            min: scale.min,
            max: scale.max,
        })
    }
}
