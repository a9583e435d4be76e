mod ids;
mod ledger;
pub mod question;
pub mod question_set;
pub mod report;
pub mod session;
mod timer;

pub use ids::{QuestionId, ReportId};
pub use ledger::AnswerLedger;
pub use question::{Question, QuestionDraft, QuestionError, QuizKind};
pub use question_set::{QuestionSet, QuestionSetError};
pub use report::{QuestionOutcome, ReportError, ResultReport};
pub use session::{AnswerEntry, ClockTick, QuizSession, SessionError, SessionState, SubmissionAttempt};
pub use timer::SessionTimer;
