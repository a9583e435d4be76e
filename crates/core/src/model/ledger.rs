use std::collections::HashMap;

use crate::model::ids::QuestionId;

/// Per-session mapping of question → chosen answer.
///
/// An absent key means "unanswered"; recording an empty string clears the
/// entry rather than storing it, so the two states stay distinguishable.
/// The empty-string placeholder exists only in the submission payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    answers: HashMap<QuestionId, String>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the selected option for a question, overwriting any prior
    /// selection. An empty (or whitespace-only) value clears the entry.
    pub fn record(&mut self, id: QuestionId, answer: impl Into<String>) {
        let answer = answer.into();
        if answer.trim().is_empty() {
            self.answers.remove(&id);
        } else {
            self.answers.insert(id, answer);
        }
    }

    /// Remove the recorded answer for a question, if any.
    pub fn clear(&mut self, id: &QuestionId) {
        self.answers.remove(id);
    }

    #[must_use]
    pub fn answer_for(&self, id: &QuestionId) -> Option<&str> {
        self.answers.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn is_answered(&self, id: &QuestionId) -> bool {
        self.answers.contains_key(id)
    }

    /// Number of distinct questions with a recorded answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }
}
