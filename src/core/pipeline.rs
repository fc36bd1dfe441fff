/// The composer: validated game state → ordered narrative context.
///
/// Wires together the scale and fact registries, the boundary catalog,
/// the lesson catalog and the voice bank. Holds no per-call state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::core::context::{NarrativeContext, Section};
use crate::core::error::{IdKind, StateError};
use crate::core::facts::{settle_value, BoundaryCatalog};
use crate::core::registry::{Registry, RegistryError, RegistryHandle};
use crate::core::transition::{self, TransitionBridge};
use crate::core::validator::Validator;
use crate::schema::fact::AbsentPolicy;
use crate::schema::snapshot::{RawState, StateSnapshot};

/// Transition lines kept per bridge unless the builder says otherwise.
pub const DEFAULT_BRIDGE_LINE_LIMIT: usize = 2;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("unknown embedded story: {0}")]
    UnknownStory(String),
}

/// The top-level composer. Built via `Composer::builder()`.
///
/// `compose` takes `&self`, so one composer can serve concurrent callers.
#[derive(Debug)]
pub struct Composer {
    registry: RegistryHandle,
    bridge_line_limit: usize,
}

#[derive(Debug)]
enum RegistrySource {
    Path(PathBuf),
    Story(String),
    Direct(Registry),
}

/// Builder for constructing a `Composer`. The last registry source set wins.
#[derive(Debug)]
pub struct ComposerBuilder {
    source: Option<RegistrySource>,
    bridge_line_limit: usize,
}

impl Composer {
    pub fn builder() -> ComposerBuilder {
        ComposerBuilder {
            source: None,
            bridge_line_limit: DEFAULT_BRIDGE_LINE_LIMIT,
        }
    }

    pub fn new(registry: Registry) -> Self {
        Self {
            registry: RegistryHandle::new(registry),
            bridge_line_limit: DEFAULT_BRIDGE_LINE_LIMIT,
        }
    }

    /// The registry generation new calls will see.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.load()
    }

    pub fn bridge_line_limit(&self) -> usize {
        self.bridge_line_limit
    }

    /// Resolve `snapshot` into its narrative context.
    ///
    /// Order: scales, facts, boundaries, lesson pairs, exemplars. Either
    /// every line resolves or the call fails with nothing emitted.
    pub fn compose(&self, snapshot: &StateSnapshot) -> Result<NarrativeContext, StateError> {
        let registry = self.registry.load();
        compose_with(&registry, snapshot)
    }

    /// Normalize raw input, then compose, against one registry generation.
    pub fn compose_raw(&self, raw: &RawState) -> Result<NarrativeContext, StateError> {
        let registry = self.registry.load();
        let snapshot = Validator::new(&registry).normalize(raw)?;
        compose_with(&registry, &snapshot)
    }

    pub fn normalize(&self, raw: &RawState) -> Result<StateSnapshot, StateError> {
        Validator::new(&self.registry.load()).normalize(raw)
    }

    /// Lines describing what changed since `previous`. Never part of the
    /// composed context.
    pub fn bridge(
        &self,
        previous: &StateSnapshot,
        current: &StateSnapshot,
    ) -> Result<TransitionBridge, StateError> {
        transition::detect(
            &self.registry.load(),
            previous,
            current,
            self.bridge_line_limit,
        )
    }

    /// Lines recalling lessons that have already landed, ascending. Kept
    /// out of the composed context like bridges.
    pub fn lesson_history(&self, snapshot: &StateSnapshot) -> Result<Vec<String>, StateError> {
        self.registry
            .load()
            .lessons()
            .history_lines(snapshot.lessons.iter().copied())
    }

    /// Swap in a new registry. Calls already running finish on the old one.
    pub fn reload(&self, registry: Registry) -> Arc<Registry> {
        self.registry.swap(registry)
    }

    /// Load a registry file and swap it in. On error the current registry
    /// stays in place.
    pub fn reload_from_ron(&self, path: &Path) -> Result<Arc<Registry>, PipelineError> {
        let registry = Registry::load_from_ron(path)?;
        Ok(self.reload(registry))
    }
}

fn compose_with(
    registry: &Registry,
    snapshot: &StateSnapshot,
) -> Result<NarrativeContext, StateError> {
    Validator::new(registry).check_ids(snapshot)?;

    let mut context = NarrativeContext::with_capacity(
        registry.scales().len()
            + registry.facts().len()
            + snapshot.boundaries.len()
            + snapshot.lessons.len() * 2
            + registry.voice().len(),
    );

    // 1. Scales, registry order
    for scale in registry.scales().iter() {
        let value = snapshot
            .scales
            .get(&scale.id)
            .ok_or_else(|| StateError::incomplete(IdKind::Scale, &scale.id))?;
        context.push(Section::Scale, registry.scales().resolve(&scale.id, *value)?);
    }

    let boundaries = BoundaryCatalog::distinct(&snapshot.boundaries);

    // 2. Facts, registry order; empty text means omit
    for fact in registry.facts().iter() {
        let value = settle_value(fact, snapshot.facts.get(&fact.id), boundaries.len())?;
        let text = match value {
            Some(ref value) => registry.facts().resolve(&fact.id, value)?,
            None if fact.when_absent == AbsentPolicy::Omit => continue,
            None => return Err(StateError::incomplete(IdKind::Fact, &fact.id)),
        };
        if !text.is_empty() {
            context.push(Section::Fact, text);
        }
    }

    // Boundaries close out the facts block, in the order they were set
    for name in &boundaries {
        context.push(Section::Fact, registry.boundaries().resolve(name)?);
    }

    // 3. Lessons, ascending index
    for lesson in registry
        .lessons()
        .resolve_unlocked(snapshot.lessons.iter().copied())?
    {
        let (insight, angle) = lesson.pair();
        context.push(Section::Lesson, insight);
        context.push(Section::Lesson, angle);
    }

    // 4. Exemplars, always last
    for line in registry.voice().all() {
        context.push(Section::Exemplar, line.as_str());
    }

    tracing::debug!(lines = context.len(), "Composed narrative context");
    Ok(context)
}

impl ComposerBuilder {
    /// Load the registry from a RON file.
    pub fn registry_path(mut self, path: impl AsRef<Path>) -> Self {
        self.source = Some(RegistrySource::Path(path.as_ref().to_path_buf()));
        self
    }

    /// Use a story compiled into the crate.
    pub fn story(mut self, name: &str) -> Self {
        self.source = Some(RegistrySource::Story(name.to_string()));
        self
    }

    /// Provide a registry directly (for testing without files).
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.source = Some(RegistrySource::Direct(registry));
        self
    }

    pub fn bridge_line_limit(mut self, limit: usize) -> Self {
        self.bridge_line_limit = limit;
        self
    }

    pub fn build(self) -> Result<Composer, PipelineError> {
        let registry = match self.source {
            None => Registry::default(),
            Some(RegistrySource::Path(path)) => Registry::load_from_ron(&path)?,
            Some(RegistrySource::Story(name)) => match Registry::embedded(&name) {
                Some(loaded) => loaded?,
                None => return Err(PipelineError::UnknownStory(name)),
            },
            Some(RegistrySource::Direct(registry)) => registry,
        };

        Ok(Composer {
            registry: RegistryHandle::new(registry),
            bridge_line_limit: self.bridge_line_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"(
        scales: [
            (id: "exhaustion", min: 0, max: 2,
             levels: { 0: "Rested.", 1: "Tired.", 2: "Done." },
             transitions: { "0->1": "It is catching up with her." }),
            (id: "conflict", min: -1, max: 1,
             levels: { -1: "Calm.", 0: "Wary.", 1: "Sparring." }),
        ],
        facts: [
            (id: "moneyPaid", kind: Flag(on: "Paid.", off: "Short."),
             transitions: { "false->true": "The money came through." }),
            (id: "carMentioned", kind: Flag(on: "The car came up.", off: ""), when_absent: Omit),
        ],
        boundaries: (known: { "no phone snooping": "Phone is off limits." }),
        lessons: [
            (index: 1, title: "one", core_insight: "Insight one.", angle: "Angle one.",
             history: Some("One has landed.")),
            (index: 2, title: "two", core_insight: "Insight two.", angle: "Angle two."),
        ],
        lesson_history: (none_yet: Some("Nothing has landed."), fallback: Some("Lesson {index} is done.")),
        exemplars: ["Voice one.", "Voice two."],
    )"#;

    fn build_test_composer() -> Composer {
        Composer::builder()
            .with_registry(Registry::parse_ron(REGISTRY).unwrap())
            .build()
            .unwrap()
    }

    fn snapshot() -> StateSnapshot {
        StateSnapshot::new()
            .with_scale("exhaustion", 1)
            .with_scale("conflict", -1)
            .with_fact("moneyPaid", true)
    }

    #[test]
    fn compose_in_section_order() {
        let composer = build_test_composer();
        let ctx = composer
            .compose(&snapshot().unlock(2).unlock(1).with_boundary("No phone snooping"))
            .unwrap();
        assert_eq!(
            ctx.render(),
            "Tired.\nCalm.\nPaid.\nPhone is off limits.\n\
             Insight one.\nAngle one.\nInsight two.\nAngle two.\n\
             Voice one.\nVoice two."
        );
        assert_eq!(ctx.section(Section::Fact).count(), 2);
    }

    #[test]
    fn empty_off_text_is_omitted() {
        let composer = build_test_composer();
        let ctx = composer
            .compose(&snapshot().with_fact("carMentioned", false))
            .unwrap();
        assert!(!ctx.render().contains("car"));
        assert_eq!(ctx.len(), 5);
    }

    #[test]
    fn compose_is_deterministic() {
        let composer = build_test_composer();
        let a = composer.compose(&snapshot().unlock(2)).unwrap();
        let b = composer.compose(&snapshot().unlock(2)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn compose_never_clamps() {
        let composer = build_test_composer();
        let err = composer
            .compose(&snapshot().with_scale("exhaustion", 3))
            .unwrap_err();
        assert!(matches!(err, StateError::OutOfRange { value: 3, min: 0, max: 2, .. }));
    }

    #[test]
    fn compose_fails_atomically() {
        let composer = build_test_composer();
        assert!(matches!(
            composer.compose(&snapshot().unlock(3)),
            Err(StateError::OutOfRange { value: 3, .. })
        ));
        assert!(matches!(
            composer.compose(&snapshot().with_boundary("no karaoke")),
            Err(StateError::UnknownId { kind: IdKind::Boundary, .. })
        ));
    }

    #[test]
    fn compose_rejects_unknown_and_missing_ids() {
        let composer = build_test_composer();
        assert_eq!(
            composer.compose(&snapshot().with_scale("dex", 1)).unwrap_err(),
            StateError::unknown(IdKind::Scale, "dex")
        );
        assert_eq!(
            composer
                .compose(&StateSnapshot::new().with_scale("exhaustion", 0))
                .unwrap_err(),
            StateError::incomplete(IdKind::Scale, "conflict")
        );

        let mut no_money = snapshot();
        no_money.facts.clear();
        assert_eq!(
            composer.compose(&no_money).unwrap_err(),
            StateError::incomplete(IdKind::Fact, "moneyPaid")
        );
    }

    #[test]
    fn compose_raw_clamps_only_where_declared() {
        let composer = build_test_composer();
        let raw = RawState::from_json(
            r#"{"scales": {"exhaustion": 7, "conflict": 0}, "facts": {"moneyPaid": true}}"#,
        )
        .unwrap();
        assert!(matches!(
            composer.compose_raw(&raw),
            Err(StateError::OutOfRange { value: 7, .. })
        ));
    }

    #[test]
    fn bridge_uses_configured_limit() {
        let composer = Composer::builder()
            .with_registry(Registry::parse_ron(REGISTRY).unwrap())
            .bridge_line_limit(1)
            .build()
            .unwrap();
        let previous = snapshot()
            .with_scale("exhaustion", 0)
            .with_fact("moneyPaid", false);
        let bridge = composer.bridge(&previous, &snapshot()).unwrap();
        assert_eq!(bridge.changed, vec!["exhaustion", "moneyPaid"]);
        assert_eq!(bridge.lines, vec!["It is catching up with her."]);
    }

    #[test]
    fn lesson_history_stays_out_of_context() {
        let composer = build_test_composer();
        let landed = snapshot().unlock(2).unlock(1);
        assert_eq!(
            composer.lesson_history(&landed).unwrap(),
            vec!["One has landed.", "Lesson 2 is done."]
        );
        assert_eq!(
            composer.lesson_history(&snapshot()).unwrap(),
            vec!["Nothing has landed."]
        );

        let ctx = composer.compose(&landed).unwrap();
        assert!(!ctx.render().contains("landed"));
        assert!(matches!(
            composer.lesson_history(&snapshot().unlock(3)),
            Err(StateError::OutOfRange { value: 3, .. })
        ));
    }

    #[test]
    fn boundary_count_tracks_named_boundaries() {
        let composer = Composer::builder()
            .with_registry(
                Registry::parse_ron(
                    r#"(
                        facts: [
                            (id: "boundaryCount",
                             kind: Buckets({ "0": "No rules.", "1": "One rule.", "2+": "Rules." }),
                             when_absent: Omit, derived_from: Some(Boundaries)),
                        ],
                        boundaries: (fallback: Some("Set: {boundary}.")),
                    )"#,
                )
                .unwrap(),
            )
            .build()
            .unwrap();

        let two = StateSnapshot::new()
            .with_boundary("no karaoke")
            .with_boundary("no\nguests")
            .with_boundary("NO KARAOKE");
        assert_eq!(
            composer.compose(&two).unwrap().render(),
            "Rules.\nSet: no karaoke.\nSet: no guests."
        );
        assert!(composer.compose(&StateSnapshot::new()).unwrap().is_empty());
        assert_eq!(
            composer
                .compose(&two.with_fact("boundaryCount", "0"))
                .unwrap_err(),
            StateError::DerivedMismatch {
                fact: "boundaryCount".to_string(),
                supplied: "0".to_string(),
                derived: "2+".to_string(),
            }
        );
    }

    #[test]
    fn reload_swaps_registry() {
        let composer = build_test_composer();
        let before = composer.registry();
        let previous = composer.reload(Registry::default());
        assert!(Arc::ptr_eq(&before, &previous));
        assert!(composer.registry().scales().is_empty());
        assert!(composer.compose(&StateSnapshot::new()).unwrap().is_empty());
    }

    #[test]
    fn builder_defaults() {
        let composer = Composer::builder().build().unwrap();
        assert_eq!(composer.bridge_line_limit(), DEFAULT_BRIDGE_LINE_LIMIT);
        assert!(composer.compose(&StateSnapshot::new()).unwrap().is_empty());
    }

    #[test]
    fn builder_unknown_story() {
        assert!(matches!(
            Composer::builder().story("dinner_party").build(),
            Err(PipelineError::UnknownStory(name)) if name == "dinner_party"
        ));
    }

    #[test]
    fn composer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Composer>();
    }
}
