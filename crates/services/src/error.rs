//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{
    QuestionError, QuestionId, QuestionSetError, QuizKind, ReportError, SessionError,
};
use storage::repository::StorageError;

/// Errors from the quiz HTTP api.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("no bearer token available")]
    MissingToken,

    #[error("request failed with status {status}: {message}")]
    HttpStatus {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while loading a question set.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The service answered, but with zero questions for the key.
    /// Distinct from transport failure: the caller shows an empty state,
    /// not a retry screen.
    #[error("no questions found for subject '{subject}' ({kind})")]
    NoContent { subject: String, kind: QuizKind },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error(transparent)]
    Set(#[from] QuestionSetError),
}

/// Errors emitted while submitting and scoring a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("answer validation failed: {0}")]
    Validation(ApiError),

    #[error("validator returned {got} results for {expected} questions")]
    ResultCountMismatch { expected: usize, got: usize },

    #[error("validator returned no result for question {id}")]
    MissingResult { id: QuestionId },

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while resolving a stored report for review.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewError {
    /// The report id does not resolve; the caller routes back to the quiz
    /// selection screen instead of rendering a broken review.
    #[error("result report not found")]
    NotFound,

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for ReviewError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => ReviewError::NotFound,
            other => ReviewError::Storage(other),
        }
    }
}
