use serde::{Deserialize, Serialize};

/// One of the fixed narrative insights a player can unlock.
///
/// Whether a lesson is unlocked is caller state, not part of the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonEntry {
    /// 1-based, stable position in the catalog.
    pub index: u32,
    pub title: String,
    pub core_insight: String,
    pub angle: String,
    /// How the lesson reads once it has already landed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
}

impl LessonEntry {
    /// The `(core insight, angle)` pair emitted into context.
    pub fn pair(&self) -> (&str, &str) {
        (&self.core_insight, &self.angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_from_ron() {
        let entry: LessonEntry = ron::from_str(
            r#"(
                index: 7,
                title: "This Isn't Hard",
                core_insight: "If they don't see strain, they assume there isn't any.",
                angle: "Your poker face is your prison",
            )"#,
        )
        .unwrap();
        assert_eq!(entry.index, 7);
        assert_eq!(
            entry.pair(),
            (
                "If they don't see strain, they assume there isn't any.",
                "Your poker face is your prison"
            )
        );
        assert_eq!(entry.history, None);
    }

    #[test]
    fn lesson_with_history() {
        let entry: LessonEntry = ron::from_str(
            r#"(
                index: 8,
                title: "You'll Figure It Out",
                core_insight: "Competence gets treated as self-sufficiency.",
                angle: "Asking for help only proves you didn't need it",
                history: Some("She already reached out for help and got told she'd figure it out."),
            )"#,
        )
        .unwrap();
        assert_eq!(
            entry.history.as_deref(),
            Some("She already reached out for help and got told she'd figure it out.")
        );
    }
}
