//! Narrative context: the composer's ordered output block.

use serde::Serialize;
use std::fmt;

/// Which part of the context a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Section {
    Scale,
    Fact,
    Lesson,
    Exemplar,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextLine {
    pub section: Section,
    pub text: String,
}

/// Ordered sentences handed to the generator: scales, facts, lessons,
/// then exemplars. Built only by the composer, so a context is always
/// complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NarrativeContext {
    lines: Vec<ContextLine>,
}

impl NarrativeContext {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, section: Section, text: impl Into<String>) {
        self.lines.push(ContextLine {
            section,
            text: text.into(),
        });
    }

    pub fn lines(&self) -> &[ContextLine] {
        &self.lines
    }

    /// Text of every line from `section`, in context order.
    pub fn section(&self, section: Section) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(move |line| line.section == section)
            .map(|line| line.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// One sentence per line, no trailing newline.
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for NarrativeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NarrativeContext {
        let mut ctx = NarrativeContext::default();
        ctx.push(Section::Scale, "Tired.");
        ctx.push(Section::Fact, "Paid.");
        ctx.push(Section::Lesson, "Insight.");
        ctx.push(Section::Lesson, "Angle.");
        ctx.push(Section::Exemplar, "Voice.");
        ctx
    }

    #[test]
    fn render_joins_without_trailing_newline() {
        let ctx = sample();
        assert_eq!(ctx.render(), "Tired.\nPaid.\nInsight.\nAngle.\nVoice.");
        assert_eq!(ctx.to_string(), ctx.render());
    }

    #[test]
    fn section_filters_in_order() {
        let ctx = sample();
        assert_eq!(ctx.section(Section::Lesson).collect::<Vec<_>>(), vec!["Insight.", "Angle."]);
        assert_eq!(ctx.section(Section::Fact).count(), 1);
        assert_eq!(ctx.len(), 5);
    }

    #[test]
    fn empty_context() {
        let ctx = NarrativeContext::default();
        assert!(ctx.is_empty());
        assert_eq!(ctx.render(), "");
    }

    #[test]
    fn serializes_with_sections() {
        let mut ctx = NarrativeContext::default();
        ctx.push(Section::Fact, "Paid.");
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"lines":[{"section":"Fact","text":"Paid."}]}"#);
    }
}
