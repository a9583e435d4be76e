use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use quiz_core::Clock;
use quiz_core::model::{
    ClockTick, QuestionSet, QuizKind, QuizSession, ReportId, ResultReport, SessionError,
    SubmissionAttempt,
};
use storage::repository::ResultStore;

use crate::api::QuizApi;
use crate::error::{LoadError, ReviewError, SubmitError};
use crate::gateway::ScoringGateway;
use crate::loader::QuestionLoader;

/// A session shared between user-driven calls and the countdown task.
pub type SharedSession = Arc<Mutex<QuizSession>>;

/// Orchestrates one quiz attempt: load, start, submit (manual or
/// timer-forced), store, review.
///
/// Each attempt owns its own session instance; the controller itself is
/// cheap to clone and holds only the clock and the collaborators.
#[derive(Clone)]
pub struct QuizController {
    clock: Clock,
    api: Arc<dyn QuizApi>,
    store: Arc<dyn ResultStore>,
}

impl QuizController {
    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn QuizApi>, store: Arc<dyn ResultStore>) -> Self {
        Self { clock, api, store }
    }

    /// Load the question set and wrap it in a fresh, not-yet-started
    /// session.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` when the set cannot be loaded; in particular
    /// `LoadError::NoContent` means the session must never start.
    pub async fn load_session(
        &self,
        subject: &str,
        kind: QuizKind,
    ) -> Result<QuizSession, LoadError> {
        let set = QuestionLoader::load(self.api.as_ref(), subject, kind).await?;
        Ok(QuizSession::new(set))
    }

    /// Start the session against the controller's clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` on a second start.
    pub fn start(&self, session: &mut QuizSession) -> Result<(), SessionError> {
        session.start(self.clock.now())
    }

    /// Manually submit a session held exclusively by the caller.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError` when the guard rejects the attempt or
    /// validation/persistence fails; on failure the session moves to
    /// `Failed` and keeps its ledger for a user-initiated retry.
    pub async fn submit(&self, session: &mut QuizSession) -> Result<ReportId, SubmitError> {
        let attempt = session.begin_submission(self.clock.now())?;
        let set = session.question_set().clone();
        let result = self.score_and_store(&set, &attempt).await;
        match result {
            Ok(report_id) => {
                session.complete(report_id.clone())?;
                Ok(report_id)
            }
            Err(err) => {
                tracing::warn!(error = %err, "submission failed");
                session.fail(err.to_string())?;
                Err(err)
            }
        }
    }

    /// Submit a shared session; both the manual action and the countdown
    /// task funnel through here.
    ///
    /// The submission guard is taken synchronously under the session
    /// lock before the validation request starts, so of two concurrent
    /// triggers exactly one sends a request; the loser resolves to
    /// `Ok(None)`. A trigger that arrives after the session terminated
    /// is likewise a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError` when the winning attempt fails.
    pub async fn submit_shared(
        &self,
        session: &SharedSession,
    ) -> Result<Option<ReportId>, SubmitError> {
        let (attempt, set) = {
            let mut guard = session.lock().await;
            match guard.begin_submission(self.clock.now()) {
                Ok(attempt) => (attempt, guard.question_set().clone()),
                Err(SessionError::SubmissionInFlight | SessionError::AlreadyCompleted) => {
                    return Ok(None);
                }
                Err(err) => return Err(err.into()),
            }
        };

        let result = self.score_and_store(&set, &attempt).await;
        let mut guard = session.lock().await;
        match result {
            Ok(report_id) => {
                guard.complete(report_id.clone())?;
                Ok(Some(report_id))
            }
            Err(err) => {
                tracing::warn!(error = %err, "submission failed");
                guard.fail(err.to_string())?;
                Err(err)
            }
        }
    }

    /// Drive the session countdown at one tick per second.
    ///
    /// The task stops as soon as the session leaves `Running`, so a
    /// manual submit (or a terminal error) can never be followed by a
    /// stale forced submit. Expiry triggers the forced-submit path at
    /// most once; losing the guard race to a manual submit is a no-op.
    pub fn spawn_clock(&self, session: SharedSession) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let tick = { session.lock().await.tick() };
                match tick {
                    ClockTick::Counting { .. } => {}
                    ClockTick::Idle => break,
                    ClockTick::Expired => {
                        tracing::info!("session time expired, forcing submission");
                        if let Err(err) = controller.submit_shared(&session).await {
                            tracing::warn!(error = %err, "forced submission failed");
                        }
                        break;
                    }
                }
            }
        })
    }

    /// Resolve a stored report for the review screen.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` when the id does not resolve; the
    /// caller routes back to quiz selection.
    pub async fn load_report(&self, id: &ReportId) -> Result<ResultReport, ReviewError> {
        Ok(self.store.load(id).await?)
    }

    async fn score_and_store(
        &self,
        set: &QuestionSet,
        attempt: &SubmissionAttempt,
    ) -> Result<ReportId, SubmitError> {
        let report = ScoringGateway::score(self.api.as_ref(), set, attempt).await?;
        let report_id = self.store.save(&report).await?;
        tracing::info!(
            report_id = %report_id,
            correct = report.correct_count(),
            total = report.total(),
            time_taken_secs = report.time_taken_secs(),
            "result report stored"
        );
        Ok(report_id)
    }
}
