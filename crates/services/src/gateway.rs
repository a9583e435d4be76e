use std::collections::HashMap;

use quiz_core::model::{QuestionOutcome, QuestionSet, ResultReport, SubmissionAttempt};

use crate::api::{QuizApi, ValidatedOutcome};
use crate::error::SubmitError;

/// Sends the answer payload for validation and assembles the scored
/// report.
pub struct ScoringGateway;

impl ScoringGateway {
    /// Validate the attempt and build the `ResultReport`.
    ///
    /// The payload is sent once; on any failure no partial report exists.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::Validation` for transport or service
    /// failures and `SubmitError::ResultCountMismatch` /
    /// `SubmitError::MissingResult` when the response does not cover the
    /// question set.
    pub async fn score(
        api: &dyn QuizApi,
        set: &QuestionSet,
        attempt: &SubmissionAttempt,
    ) -> Result<ResultReport, SubmitError> {
        let results = api
            .validate_answers(&attempt.answers)
            .await
            .map_err(SubmitError::Validation)?;
        Self::merge(set, attempt, results)
    }

    /// Merge validator outcomes with locally held question metadata.
    ///
    /// Outcomes are matched by question id where the validator provides
    /// one, falling back to position for parallel-ordered responses. The
    /// validator owns correctness and the correct answer; prompt,
    /// options, explanation and video link fall back to the local
    /// question when the response is minimal.
    pub(crate) fn merge(
        set: &QuestionSet,
        attempt: &SubmissionAttempt,
        results: Vec<ValidatedOutcome>,
    ) -> Result<ResultReport, SubmitError> {
        if results.len() != set.len() {
            return Err(SubmitError::ResultCountMismatch {
                expected: set.len(),
                got: results.len(),
            });
        }

        let mut slots: Vec<Option<ValidatedOutcome>> = results.into_iter().map(Some).collect();
        let index_by_id: HashMap<_, _> = slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref()
                    .and_then(|o| o.question_id.clone())
                    .map(|id| (id, i))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(set.len());
        for (i, question) in set.questions().iter().enumerate() {
            let slot = index_by_id.get(question.id()).copied().unwrap_or(i);
            let validated = slots
                .get_mut(slot)
                .and_then(Option::take)
                .ok_or_else(|| SubmitError::MissingResult {
                    id: question.id().clone(),
                })?;

            outcomes.push(QuestionOutcome {
                question_id: question.id().clone(),
                prompt: validated
                    .question
                    .unwrap_or_else(|| question.prompt().to_string()),
                options: validated
                    .options
                    .filter(|opts| !opts.is_empty())
                    .unwrap_or_else(|| question.options().to_vec()),
                user_answer: validated
                    .user_answer
                    .unwrap_or_else(|| attempt.answers[i].user_answer.clone()),
                correct_answer: validated.correct_answer,
                is_correct: validated.is_correct,
                explanation: validated
                    .explanation
                    .unwrap_or_else(|| question.explanation().to_string()),
                video_solution_url: validated
                    .video_solution_url
                    .or_else(|| question.video_solution_url().map(|u| u.to_string())),
            });
        }

        let report = ResultReport::new(
            set.subject(),
            set.kind(),
            attempt.time_taken_secs,
            outcomes,
        )?;
        tracing::debug!(
            subject = set.subject(),
            correct = report.correct_count(),
            total = report.total(),
            "result report assembled"
        );
        Ok(report)
    }
}
