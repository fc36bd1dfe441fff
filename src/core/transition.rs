//! Transition bridges: short lines describing what moved between two turns.

use serde::Serialize;

use crate::core::error::{IdKind, StateError};
use crate::core::registry::Registry;
use crate::core::validator::Validator;
use crate::schema::snapshot::StateSnapshot;

/// Ids whose value changed between two snapshots, plus the declared
/// transition lines for those changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransitionBridge {
    /// Scale then fact ids, in registry order.
    pub changed: Vec<String>,
    /// At most `limit` lines.
    pub lines: Vec<String>,
}

impl TransitionBridge {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Compare `previous` against `current`.
///
/// Every scale must be present in both snapshots. Facts are compared only
/// when both carry a value.
pub fn detect(
    registry: &Registry,
    previous: &StateSnapshot,
    current: &StateSnapshot,
    limit: usize,
) -> Result<TransitionBridge, StateError> {
    let validator = Validator::new(registry);
    validator.check_ids(previous)?;
    validator.check_ids(current)?;

    let mut bridge = TransitionBridge::default();
    let mut push = |id: &str, text: Option<&str>| {
        bridge.changed.push(id.to_string());
        if let Some(text) = text {
            if bridge.lines.len() < limit {
                bridge.lines.push(text.to_string());
            }
        }
    };

    for scale in registry.scales().iter() {
        let value_in = |snapshot: &StateSnapshot| {
            snapshot
                .scales
                .get(&scale.id)
                .copied()
                .ok_or_else(|| StateError::incomplete(IdKind::Scale, &scale.id))
        };
        let (from, to) = (value_in(previous)?, value_in(current)?);
        if from != to {
            push(&scale.id, scale.transition_text(from, to));
        }
    }

    for fact in registry.facts().iter() {
        if let (Some(from), Some(to)) = (previous.facts.get(&fact.id), current.facts.get(&fact.id))
        {
            if from != to {
                push(&fact.id, fact.transition_text(from, to));
            }
        }
    }

    Ok(bridge)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"(
        scales: [
            (id: "exhaustion", min: 0, max: 2, levels: { 0: "a", 1: "b", 2: "c" },
             transitions: { "0->1": "The tiredness is starting to show.", "1->2": "She is running on fumes." }),
            (id: "awareness", min: 0, max: 1, levels: { 0: "a", 1: "b" },
             transitions: { "0->1": "Something clicked." }),
            (id: "tension", min: 0, max: 1, levels: { 0: "a", 1: "b" }),
        ],
        facts: [
            (id: "moneyPaid", kind: Flag(on: "paid", off: "short"),
             transitions: { "false->true": "The rent finally landed." }),
        ],
    )"#;

    fn snapshot(exhaustion: i64, awareness: i64, tension: i64) -> StateSnapshot {
        StateSnapshot::new()
            .with_scale("exhaustion", exhaustion)
            .with_scale("awareness", awareness)
            .with_scale("tension", tension)
    }

    #[test]
    fn unchanged_state_has_no_bridge() {
        let registry = Registry::parse_ron(REGISTRY).unwrap();
        let bridge = detect(&registry, &snapshot(1, 0, 0), &snapshot(1, 0, 0), 2).unwrap();
        assert!(bridge.is_empty());
        assert!(bridge.lines.is_empty());
    }

    #[test]
    fn changes_follow_registry_order() {
        let registry = Registry::parse_ron(REGISTRY).unwrap();
        let previous = snapshot(0, 0, 0).with_fact("moneyPaid", false);
        let current = snapshot(1, 1, 1).with_fact("moneyPaid", true);

        let bridge = detect(&registry, &previous, &current, 10).unwrap();
        assert_eq!(bridge.changed, vec!["exhaustion", "awareness", "tension", "moneyPaid"]);
        assert_eq!(
            bridge.lines,
            vec![
                "The tiredness is starting to show.",
                "Something clicked.",
                "The rent finally landed.",
            ]
        );
    }

    #[test]
    fn lines_are_capped() {
        let registry = Registry::parse_ron(REGISTRY).unwrap();
        let previous = snapshot(0, 0, 0).with_fact("moneyPaid", false);
        let current = snapshot(1, 1, 0).with_fact("moneyPaid", true);

        let bridge = detect(&registry, &previous, &current, 1).unwrap();
        assert_eq!(bridge.changed.len(), 3);
        assert_eq!(bridge.lines, vec!["The tiredness is starting to show."]);
    }

    #[test]
    fn undeclared_direction_records_change_only() {
        let registry = Registry::parse_ron(REGISTRY).unwrap();
        let bridge = detect(&registry, &snapshot(2, 0, 0), &snapshot(1, 0, 0), 2).unwrap();
        assert_eq!(bridge.changed, vec!["exhaustion"]);
        assert!(bridge.lines.is_empty());
    }

    #[test]
    fn fact_missing_on_one_side_is_skipped() {
        let registry = Registry::parse_ron(REGISTRY).unwrap();
        let previous = snapshot(0, 0, 0);
        let current = snapshot(0, 0, 0).with_fact("moneyPaid", true);
        assert!(detect(&registry, &previous, &current, 2).unwrap().is_empty());
    }

    #[test]
    fn missing_scale_is_incomplete() {
        let registry = Registry::parse_ron(REGISTRY).unwrap();
        let previous = StateSnapshot::new().with_scale("exhaustion", 0);
        assert_eq!(
            detect(&registry, &previous, &snapshot(0, 0, 0), 2),
            Err(StateError::incomplete(IdKind::Scale, "awareness"))
        );
    }
}
