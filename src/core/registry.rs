//! The aggregate registry: RON loading, load-time checks and atomic swaps.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

use crate::core::facts::{BoundaryCatalog, FactRegistry, BOUNDARY_PLACEHOLDER};
use crate::core::lessons::{LessonCatalog, LESSON_PLACEHOLDER};
use crate::core::scales::ScaleRegistry;
use crate::core::voice::VoiceBank;
use crate::schema::fact::{AbsentPolicy, Fact, FactKind, FactSource};
use crate::schema::lesson::LessonEntry;
use crate::schema::scale::{RangePolicy, Scale};
use crate::schema::transition::Transition;

const NO_VACANCIES: &str = include_str!("../../story_data/no_vacancies/registry.ron");

/// Stories compiled into the crate, by name.
pub const EMBEDDED_STORIES: &[(&str, &str)] = &[("no_vacancies", NO_VACANCIES)];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("scale '{scale}' has an empty range {min}..={max}")]
    InvalidRange { scale: String, min: i64, max: i64 },
    #[error("scale '{scale}' has no text for level {level}")]
    MissingLevel { scale: String, level: i64 },
    #[error("scale '{scale}' declares level {level} outside {min}..={max}")]
    StrayLevel {
        scale: String,
        level: i64,
        min: i64,
        max: i64,
    },
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    #[error("lesson at position {position} has index {found}; lessons must be numbered 1..=N in order")]
    LessonOrder { position: usize, found: u32 },
    #[error("bucket fact '{0}' declares no states")]
    EmptyBuckets(String),
    #[error("'{id}' has an invalid transition '{key}'")]
    BadTransition { id: String, key: String },
    #[error("fact '{0}' is derived from boundaries and must be a bucket fact")]
    BadDerivation(String),
    #[error("boundary fallback must contain the {{boundary}} placeholder")]
    BadFallback,
    #[error("lesson history fallback must contain the {{index}} placeholder")]
    BadLessonFallback,
}

/// Every table the composer resolves against. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    scales: ScaleRegistry,
    facts: FactRegistry,
    boundaries: BoundaryCatalog,
    lessons: LessonCatalog,
    voice: VoiceBank,
}

// RON shapes. Level tables and transitions are keyed maps in the data
// file and get checked and flattened into the schema types on load.

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RonRegistry {
    #[serde(default)]
    scales: Vec<RonScale>,
    #[serde(default)]
    facts: Vec<RonFact>,
    #[serde(default)]
    boundaries: RonBoundaries,
    #[serde(default)]
    lessons: Vec<LessonEntry>,
    #[serde(default)]
    lesson_history: RonLessonHistory,
    #[serde(default)]
    exemplars: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RonScale {
    id: String,
    min: i64,
    max: i64,
    #[serde(default)]
    out_of_range: RangePolicy,
    levels: BTreeMap<i64, String>,
    #[serde(default)]
    transitions: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RonFact {
    id: String,
    kind: FactKind,
    #[serde(default)]
    when_absent: AbsentPolicy,
    #[serde(default)]
    derived_from: Option<FactSource>,
    #[serde(default)]
    transitions: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RonBoundaries {
    #[serde(default)]
    known: BTreeMap<String, String>,
    #[serde(default)]
    fallback: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RonLessonHistory {
    #[serde(default)]
    none_yet: Option<String>,
    #[serde(default)]
    fallback: Option<String>,
}

impl Registry {
    /// Load a registry from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Registry, RegistryError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a registry from a RON string, checking every table for
    /// completeness before anything can be resolved against it.
    pub fn parse_ron(input: &str) -> Result<Registry, RegistryError> {
        let raw: RonRegistry = ron::from_str(input)?;
        let mut ids = FxHashSet::default();

        let mut scales = Vec::with_capacity(raw.scales.len());
        for ron_scale in raw.scales {
            if !ids.insert(ron_scale.id.clone()) {
                return Err(RegistryError::DuplicateId(ron_scale.id));
            }
            scales.push(build_scale(ron_scale)?);
        }

        let mut facts = Vec::with_capacity(raw.facts.len());
        for ron_fact in raw.facts {
            if !ids.insert(ron_fact.id.clone()) {
                return Err(RegistryError::DuplicateId(ron_fact.id));
            }
            facts.push(build_fact(ron_fact)?);
        }

        let boundaries = build_boundaries(raw.boundaries)?;

        for (position, lesson) in raw.lessons.iter().enumerate() {
            if usize::try_from(lesson.index).ok() != Some(position + 1) {
                return Err(RegistryError::LessonOrder {
                    position: position + 1,
                    found: lesson.index,
                });
            }
        }
        if let Some(ref fallback) = raw.lesson_history.fallback {
            if !fallback.contains(LESSON_PLACEHOLDER) {
                return Err(RegistryError::BadLessonFallback);
            }
        }

        let registry = Registry {
            scales: ScaleRegistry::new(scales),
            facts: FactRegistry::new(facts),
            boundaries,
            lessons: LessonCatalog::new(raw.lessons)
                .with_history(raw.lesson_history.none_yet, raw.lesson_history.fallback),
            voice: VoiceBank::new(raw.exemplars),
        };

        tracing::debug!(
            scales = registry.scales.len(),
            facts = registry.facts.len(),
            boundaries = registry.boundaries.len(),
            lessons = registry.lessons.len(),
            exemplars = registry.voice.len(),
            "Loaded registry"
        );

        Ok(registry)
    }

    /// Parse a story compiled into the crate, or `None` if no story has
    /// that name.
    pub fn embedded(name: &str) -> Option<Result<Registry, RegistryError>> {
        EMBEDDED_STORIES
            .iter()
            .find(|(story, _)| *story == name)
            .map(|(_, data)| Self::parse_ron(data))
    }

    /// The shipped "No Vacancies" tables.
    pub fn no_vacancies() -> Result<Registry, RegistryError> {
        Self::parse_ron(NO_VACANCIES)
    }

    pub fn scales(&self) -> &ScaleRegistry {
        &self.scales
    }

    pub fn facts(&self) -> &FactRegistry {
        &self.facts
    }

    pub fn boundaries(&self) -> &BoundaryCatalog {
        &self.boundaries
    }

    pub fn lessons(&self) -> &LessonCatalog {
        &self.lessons
    }

    pub fn voice(&self) -> &VoiceBank {
        &self.voice
    }
}

fn build_scale(raw: RonScale) -> Result<Scale, RegistryError> {
    let RonScale {
        id,
        min,
        max,
        out_of_range,
        mut levels,
        transitions,
    } = raw;

    if min > max {
        return Err(RegistryError::InvalidRange { scale: id, min, max });
    }
    if let Some(&level) = levels.keys().find(|level| !(min..=max).contains(*level)) {
        return Err(RegistryError::StrayLevel {
            scale: id,
            level,
            min,
            max,
        });
    }

    let mut texts = Vec::with_capacity(levels.len());
    for level in min..=max {
        match levels.remove(&level) {
            Some(text) => texts.push(text),
            None => return Err(RegistryError::MissingLevel { scale: id, level }),
        }
    }

    let transitions = build_transitions(&id, transitions, |side| {
        let value: i64 = side.parse().ok()?;
        (min..=max).contains(&value).then(|| value.to_string())
    })?;

    Ok(Scale::from_parts(id, min, max, out_of_range, texts, transitions))
}

fn build_fact(raw: RonFact) -> Result<Fact, RegistryError> {
    if raw.derived_from.is_some() && !matches!(raw.kind, FactKind::Buckets(_)) {
        return Err(RegistryError::BadDerivation(raw.id));
    }

    let transitions = match &raw.kind {
        FactKind::Flag { .. } => build_transitions(&raw.id, raw.transitions, |side| {
            matches!(side, "true" | "false").then(|| side.to_string())
        })?,
        FactKind::Buckets(states) => {
            if states.is_empty() {
                return Err(RegistryError::EmptyBuckets(raw.id));
            }
            build_transitions(&raw.id, raw.transitions, |side| {
                states.contains_key(side).then(|| side.to_string())
            })?
        }
    };

    Ok(Fact {
        id: raw.id,
        kind: raw.kind,
        when_absent: raw.when_absent,
        derived_from: raw.derived_from,
        transitions,
    })
}

/// Check `from->to` keys. `canonical` returns the stored form of a valid
/// side, or `None` when that side is not a value of the scale or fact.
fn build_transitions<F>(
    id: &str,
    raw: BTreeMap<String, String>,
    canonical: F,
) -> Result<Vec<Transition>, RegistryError>
where
    F: Fn(&str) -> Option<String>,
{
    raw.into_iter()
        .map(|(key, text)| {
            let bad = || RegistryError::BadTransition {
                id: id.to_string(),
                key: key.clone(),
            };
            let (from, to) = Transition::split_key(&key).ok_or_else(bad)?;
            let from = canonical(from).ok_or_else(bad)?;
            let to = canonical(to).ok_or_else(bad)?;
            if from == to {
                return Err(bad());
            }
            Ok(Transition { from, to, text })
        })
        .collect()
}

fn build_boundaries(raw: RonBoundaries) -> Result<BoundaryCatalog, RegistryError> {
    if let Some(ref fallback) = raw.fallback {
        if !fallback.contains(BOUNDARY_PLACEHOLDER) {
            return Err(RegistryError::BadFallback);
        }
    }

    let mut known = FxHashMap::default();
    for (name, text) in raw.known {
        let key = BoundaryCatalog::normalize(&name);
        if known.insert(key, text).is_some() {
            return Err(RegistryError::DuplicateId(name));
        }
    }

    Ok(BoundaryCatalog::new(known, raw.fallback))
}

/// Shared, swappable registry.
///
/// Readers take an `Arc` of the current generation and keep it for the
/// whole call, so a swap never exposes a half-updated registry.
#[derive(Debug)]
pub struct RegistryHandle {
    current: RwLock<Arc<Registry>>,
}

impl RegistryHandle {
    pub fn new(registry: Registry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// The current registry generation.
    pub fn load(&self) -> Arc<Registry> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Replace the registry wholesale, returning the previous generation.
    pub fn swap(&self, registry: Registry) -> Arc<Registry> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, Arc::new(registry));
        tracing::debug!(
            scales = guard.scales().len(),
            facts = guard.facts().len(),
            "Swapped registry"
        );
        previous
    }
}

impl Default for RegistryHandle {
    fn default() -> Self {
        Self::new(Registry::default())
    }
}
