use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::QuizKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReportError {
    #[error("a result report must contain at least one outcome")]
    Empty,
}

/// Scored outcome for a single question, as shown on the review screen.
///
/// Correctness and the correct answer come from the validator; prompt,
/// options and media references are filled in from the locally held
/// question metadata, since the validator response may be minimal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
    pub video_solution_url: Option<String>,
}

/// The immutable scored summary produced after validation.
///
/// Created exactly once, at submission time, and stored under a freshly
/// generated report identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultReport {
    subject: String,
    kind: QuizKind,
    time_taken_secs: u64,
    outcomes: Vec<QuestionOutcome>,
}

impl ResultReport {
    /// Assemble a report from per-question outcomes.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Empty` if no outcomes are provided.
    pub fn new(
        subject: impl Into<String>,
        kind: QuizKind,
        time_taken_secs: u64,
        outcomes: Vec<QuestionOutcome>,
    ) -> Result<Self, ReportError> {
        if outcomes.is_empty() {
            return Err(ReportError::Empty);
        }
        Ok(Self {
            subject: subject.into(),
            kind,
            time_taken_secs,
            outcomes,
        })
    }

    /// Rehydrate a report from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Empty` if the stored outcome list is empty.
    pub fn from_persisted(
        subject: String,
        kind: QuizKind,
        time_taken_secs: u64,
        outcomes: Vec<QuestionOutcome>,
    ) -> Result<Self, ReportError> {
        Self::new(subject, kind, time_taken_secs, outcomes)
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
    pub fn time_taken_secs(&self) -> u64 {
        self.time_taken_secs
    }

    #[must_use]
    pub fn outcomes(&self) -> &[QuestionOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_correct).count()
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        self.correct_count() as f64 / self.total() as f64 * 100.0
    }
}
