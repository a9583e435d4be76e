use thiserror::Error;

use crate::model::question::QuestionError;
use crate::model::question_set::QuestionSetError;
use crate::model::report::ReportError;
use crate::model::session::SessionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    QuestionSet(#[from] QuestionSetError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
