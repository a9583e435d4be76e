use thiserror::Error;

use crate::model::question::{Question, QuizKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionSetError {
    #[error("no questions for subject '{subject}' ({kind})")]
    Empty { subject: String, kind: QuizKind },
}

/// The fixed, ordered collection of questions for one session.
///
/// Order is set at load time and defines navigation indices for the
/// session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    subject: String,
    kind: QuizKind,
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Build a question set for the given (subject, kind) key.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSetError::Empty` if no questions are provided; a
    /// session must never start over an empty set.
    pub fn new(
        subject: impl Into<String>,
        kind: QuizKind,
        questions: Vec<Question>,
    ) -> Result<Self, QuestionSetError> {
        let subject = subject.into();
        if questions.is_empty() {
            return Err(QuestionSetError::Empty { subject, kind });
        }
        Ok(Self {
            subject,
            kind,
            questions,
        })
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn kind(&self) -> QuizKind {
        self.kind
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Total seconds allotted for a session over this set.
    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        self.questions.len() as u64 * self.kind.seconds_per_question()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::QuestionId;
    use crate::model::question::QuestionDraft;

    fn build_question(id: &str, kind: QuizKind) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("Prompt {id}"),
            options: vec!["a".to_string(), "b".to_string()],
            correct_answer: "a".to_string(),
            explanation: String::new(),
            subject: "Maths".to_string(),
            kind,
            image: None,
            video_solution_url: None,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn empty_set_is_rejected() {
        let err = QuestionSet::new("Maths", QuizKind::Quiz, Vec::new()).unwrap_err();
        assert!(matches!(err, QuestionSetError::Empty { .. }));
    }

    #[test]
    fn quiz_allots_sixty_seconds_per_question() {
        let questions: Vec<_> = (1..=4)
            .map(|i| build_question(&format!("q{i}"), QuizKind::Quiz))
            .collect();
        let set = QuestionSet::new("Maths", QuizKind::Quiz, questions).unwrap();
        assert_eq!(set.total_seconds(), 240);
    }

    #[test]
    fn practice_allots_two_minutes_per_question() {
        let questions: Vec<_> = (1..=3)
            .map(|i| build_question(&format!("q{i}"), QuizKind::Practice))
            .collect();
        let set = QuestionSet::new("Maths", QuizKind::Practice, questions).unwrap();
        assert_eq!(set.total_seconds(), 360);
    }

    #[test]
    fn order_is_preserved() {
        let questions = vec![
            build_question("first", QuizKind::Quiz),
            build_question("second", QuizKind::Quiz),
        ];
        let set = QuestionSet::new("Maths", QuizKind::Quiz, questions).unwrap();
        assert_eq!(set.get(0).unwrap().id().as_str(), "first");
        assert_eq!(set.get(1).unwrap().id().as_str(), "second");
        assert!(set.get(2).is_none());
    }
}
