//! Voice exemplar bank: fixed lines that prime the generator's tone.

/// Tone exemplars, emitted verbatim and in order after all state lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceBank {
    exemplars: Vec<String>,
}

impl VoiceBank {
    pub fn new(exemplars: Vec<String>) -> Self {
        Self { exemplars }
    }

    /// Every exemplar line in bank order.
    pub fn all(&self) -> &[String] {
        &self.exemplars
    }

    pub fn len(&self) -> usize {
        self.exemplars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exemplars.is_empty()
    }
}
