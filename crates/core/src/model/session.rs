use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, ReportId};
use crate::model::ledger::AnswerLedger;
use crate::model::question::Question;
use crate::model::question_set::QuestionSet;
use crate::model::timer::SessionTimer;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session already started")]
    AlreadyStarted,

    #[error("session is not running")]
    NotRunning,

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("session already completed")]
    AlreadyCompleted,

    #[error("no submission in flight")]
    NotSubmitting,

    #[error("question index {index} out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Lifecycle of a quiz session. Owned exclusively by `QuizSession`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    Submitting,
    Completed,
    Failed,
}

/// Outcome of a one-second clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// The session is not running; the clock should stop.
    Idle,
    /// Still counting down.
    Counting { remaining_secs: u64 },
    /// The countdown just reached zero; a forced submit is due.
    Expired,
}

/// One entry of the submission payload, in question-set order.
///
/// Unanswered questions carry an empty-string placeholder; the validator
/// expects exactly one entry per question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub question_id: QuestionId,
    pub user_answer: String,
}

/// Snapshot handed out by `begin_submission`: the ordered payload plus the
/// wall-clock seconds the user spent before submitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAttempt {
    pub answers: Vec<AnswerEntry>,
    pub time_taken_secs: u64,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state machine for a single quiz attempt.
///
/// Owns the question set, the answer ledger, the navigation cursor, and
/// the countdown timer. All submission triggers (manual or timer-forced)
/// must pass through `begin_submission`, which is the single guard
/// against double submission: it flips `Running → Submitting`
/// synchronously, so a second trigger observes `Submitting` and backs
/// off before any network call starts.
#[derive(Debug, Clone)]
pub struct QuizSession {
    set: QuestionSet,
    ledger: AnswerLedger,
    cursor: usize,
    timer: SessionTimer,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    time_taken_secs: Option<u64>,
    report_id: Option<ReportId>,
    failure: Option<String>,
}

impl QuizSession {
    /// Create a session over an already-loaded, non-empty question set.
    #[must_use]
    pub fn new(set: QuestionSet) -> Self {
        let timer = SessionTimer::new(set.total_seconds());
        Self {
            set,
            ledger: AnswerLedger::new(),
            cursor: 0,
            timer,
            state: SessionState::NotStarted,
            started_at: None,
            time_taken_secs: None,
            report_id: None,
            failure: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn question_set(&self) -> &QuestionSet {
        &self.set
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        // The set is non-empty and the cursor is clamped to its bounds.
        &self.set.questions()[self.cursor]
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn report_id(&self) -> Option<&ReportId> {
        self.report_id.as_ref()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    #[must_use]
    pub fn total_secs(&self) -> u64 {
        self.timer.total_secs()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        self.timer.remaining_secs()
    }

    /// Number of distinct questions with a recorded answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.ledger.answered_count()
    }

    #[must_use]
    pub fn answer_for(&self, id: &QuestionId) -> Option<&str> {
        self.ledger.answer_for(id)
    }

    /// Position through the set as a percentage, based on the cursor.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        (self.cursor + 1) as f64 / self.set.len() as f64 * 100.0
    }

    /// Begin the session: `NotStarted → Running`, capturing the start
    /// timestamp the elapsed time is later measured against.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is in
    /// `NotStarted`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.state != SessionState::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        self.started_at = Some(now);
        self.state = SessionState::Running;
        Ok(())
    }

    /// Record the selected option for the question under the cursor.
    ///
    /// Overwrites any prior selection; an empty value clears it. Does not
    /// move the cursor or touch the timer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRunning` outside the `Running` state.
    pub fn select_answer(&mut self, answer: impl Into<String>) -> Result<(), SessionError> {
        if self.state != SessionState::Running {
            return Err(SessionError::NotRunning);
        }
        let id = self.current_question().id().clone();
        self.ledger.record(id, answer);
        Ok(())
    }

    /// Clear the recorded answer for the question under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRunning` outside the `Running` state.
    pub fn clear_answer(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Running {
            return Err(SessionError::NotRunning);
        }
        let id = self.current_question().id().clone();
        self.ledger.clear(&id);
        Ok(())
    }

    /// Move to the next question, clamped at the last index. No-op when
    /// the session is not running. Returns the cursor after the move.
    pub fn advance(&mut self) -> usize {
        if self.state == SessionState::Running && self.cursor + 1 < self.set.len() {
            self.cursor += 1;
        }
        self.cursor
    }

    /// Move to the previous question, clamped at zero. No-op when the
    /// session is not running. Returns the cursor after the move.
    pub fn retreat(&mut self) -> usize {
        if self.state == SessionState::Running {
            self.cursor = self.cursor.saturating_sub(1);
        }
        self.cursor
    }

    /// Jump directly to any question, answered or not.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRunning` outside `Running`, or
    /// `SessionError::IndexOutOfRange` for an invalid index.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SessionError> {
        if self.state != SessionState::Running {
            return Err(SessionError::NotRunning);
        }
        if index >= self.set.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.set.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    /// Count down one second of session time.
    ///
    /// Returns `ClockTick::Expired` exactly once, on the tick that reaches
    /// zero while the session is still running; the driver must then take
    /// the forced-submit path. Returns `ClockTick::Idle` whenever the
    /// session has left `Running`, signalling the clock to stop so a stale
    /// timer can never fire after a manual submit.
    pub fn tick(&mut self) -> ClockTick {
        if self.state != SessionState::Running {
            return ClockTick::Idle;
        }
        if self.timer.tick() {
            ClockTick::Expired
        } else {
            ClockTick::Counting {
                remaining_secs: self.timer.remaining_secs(),
            }
        }
    }

    /// Claim the right to submit: `Running → Submitting`.
    ///
    /// This is the submission guard. It must be called synchronously by
    /// both the manual and the timer-forced trigger before any validation
    /// request is sent; whichever caller loses the race gets
    /// `SessionError::SubmissionInFlight` and must treat it as a no-op.
    ///
    /// A session in `Failed` may re-enter submission (a user-initiated
    /// retry keeps the ledger and the originally captured elapsed time);
    /// `Running` is never restored after a failed submit.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SubmissionInFlight` while a submission is
    /// pending, `SessionError::AlreadyCompleted` after success, and
    /// `SessionError::NotRunning` before the session starts.
    pub fn begin_submission(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<SubmissionAttempt, SessionError> {
        match self.state {
            SessionState::Running => {
                let started = self.started_at.ok_or(SessionError::NotRunning)?;
                let elapsed = (now - started).num_seconds().max(0) as u64;
                self.time_taken_secs = Some(elapsed);
            }
            // Retry after a failed submit: elapsed time was captured on
            // the first attempt and is deliberately not extended.
            SessionState::Failed => {
                self.failure = None;
            }
            SessionState::Submitting => return Err(SessionError::SubmissionInFlight),
            SessionState::Completed => return Err(SessionError::AlreadyCompleted),
            SessionState::NotStarted => return Err(SessionError::NotRunning),
        }

        self.state = SessionState::Submitting;
        Ok(SubmissionAttempt {
            answers: self.answer_payload(),
            time_taken_secs: self.time_taken_secs.unwrap_or(0),
        })
    }

    /// Resolve the in-flight submission as successful.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitting` if no submission is pending.
    pub fn complete(&mut self, report_id: ReportId) -> Result<(), SessionError> {
        if self.state != SessionState::Submitting {
            return Err(SessionError::NotSubmitting);
        }
        self.report_id = Some(report_id);
        self.state = SessionState::Completed;
        Ok(())
    }

    /// Resolve the in-flight submission as failed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitting` if no submission is pending.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        if self.state != SessionState::Submitting {
            return Err(SessionError::NotSubmitting);
        }
        self.failure = Some(message.into());
        self.state = SessionState::Failed;
        Ok(())
    }

    /// One payload entry per question, in set order, with empty-string
    /// placeholders for unanswered questions.
    fn answer_payload(&self) -> Vec<AnswerEntry> {
        self.set
            .questions()
            .iter()
            .map(|q| AnswerEntry {
                question_id: q.id().clone(),
                user_answer: self
                    .ledger
                    .answer_for(q.id())
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect()
    }
}
