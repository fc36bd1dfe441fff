//! Lesson catalog: unlockable insights, always emitted in index order.

use std::collections::BTreeSet;

use crate::core::error::StateError;
use crate::schema::lesson::LessonEntry;

/// Id reported in `OutOfRange` errors for lesson indices.
pub const LESSONS_ID: &str = "lessons";

/// Marker in the history fallback replaced by the lesson index.
pub const LESSON_PLACEHOLDER: &str = "{index}";

/// Lessons numbered `1..=len()`, stored in index order.
#[derive(Debug, Clone, Default)]
pub struct LessonCatalog {
    lessons: Vec<LessonEntry>,
    none_yet: Option<String>,
    fallback: Option<String>,
}

impl LessonCatalog {
    /// `lessons` must already be numbered `1..=N` in order.
    pub(crate) fn new(lessons: Vec<LessonEntry>) -> Self {
        Self {
            lessons,
            none_yet: None,
            fallback: None,
        }
    }

    /// History defaults: the line used when nothing has landed, and the
    /// template for a landed lesson with no history of its own.
    pub(crate) fn with_history(mut self, none_yet: Option<String>, fallback: Option<String>) -> Self {
        self.none_yet = none_yet;
        self.fallback = fallback;
        self
    }

    pub fn get(&self, index: u32) -> Option<&LessonEntry> {
        let offset = usize::try_from(index.checked_sub(1)?).ok()?;
        self.lessons.get(offset)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LessonEntry> {
        self.lessons.iter()
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// Check a single index against `1..=len()`.
    pub fn check_index(&self, index: i64) -> Result<u32, StateError> {
        let max = self.lessons.len() as i64;
        match u32::try_from(index) {
            Ok(valid) if index >= 1 && index <= max => Ok(valid),
            _ => Err(StateError::OutOfRange {
                id: LESSONS_ID.to_string(),
                value: index,
                min: 1,
                max,
            }),
        }
    }

    /// Unlocked lessons in ascending index order, duplicates collapsed.
    ///
    /// Input order is irrelevant: `{9, 3}` yields lesson 3 then lesson 9.
    pub fn resolve_unlocked<I>(&self, unlocked: I) -> Result<Vec<&LessonEntry>, StateError>
    where
        I: IntoIterator<Item = u32>,
    {
        let indices: BTreeSet<u32> = unlocked.into_iter().collect();
        indices
            .into_iter()
            .map(|index| {
                let index = self.check_index(i64::from(index))?;
                self.get(index).ok_or_else(|| StateError::OutOfRange {
                    id: LESSONS_ID.to_string(),
                    value: i64::from(index),
                    min: 1,
                    max: self.lessons.len() as i64,
                })
            })
            .collect()
    }

    /// What the player has already been through, one line per unlocked
    /// lesson in ascending order.
    ///
    /// Lessons with no history and no fallback template add nothing. With
    /// nothing unlocked the "none yet" line stands alone, if there is one.
    pub fn history_lines<I>(&self, unlocked: I) -> Result<Vec<String>, StateError>
    where
        I: IntoIterator<Item = u32>,
    {
        let landed = self.resolve_unlocked(unlocked)?;
        if landed.is_empty() {
            return Ok(self.none_yet.iter().cloned().collect());
        }
        Ok(landed
            .into_iter()
            .filter_map(|lesson| match (&lesson.history, &self.fallback) {
                (Some(history), _) => Some(history.clone()),
                (None, Some(template)) => {
                    Some(template.replace(LESSON_PLACEHOLDER, &lesson.index.to_string()))
                }
                (None, None) => None,
            })
            .collect())
    }
}
