use quiz_core::model::{QuestionDraft, QuestionSet, QuizKind};

use crate::api::QuizApi;
use crate::error::LoadError;

/// Fetches and normalizes the question set for a session.
///
/// One request per invocation, no retries; a failed load is terminal for
/// the attempt and the caller may simply invoke the loader again.
pub struct QuestionLoader;

impl QuestionLoader {
    /// Load the question set for a (subject, kind) key.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::NoContent` when the service has no questions
    /// for the key, and other `LoadError` variants for transport or
    /// normalization failures.
    pub async fn load(
        api: &dyn QuizApi,
        subject: &str,
        kind: QuizKind,
    ) -> Result<QuestionSet, LoadError> {
        let drafts = api.fetch_questions(subject, kind).await?;
        if drafts.is_empty() {
            return Err(LoadError::NoContent {
                subject: subject.to_string(),
                kind,
            });
        }

        let questions = drafts
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let set = QuestionSet::new(subject, kind, questions)?;

        tracing::debug!(
            subject,
            kind = %kind,
            count = set.len(),
            total_secs = set.total_seconds(),
            "question set loaded"
        );
        Ok(set)
    }
}
