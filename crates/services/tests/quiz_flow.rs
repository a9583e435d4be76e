use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use quiz_core::model::{
    AnswerEntry, ClockTick, QuestionDraft, QuestionId, QuizKind, QuizSession, SessionState,
};
use quiz_core::time::fixed_now;
use services::{
    ApiError, Clock, LoadError, QuizApi, QuizController, SharedSession, SubmitError,
    ValidatedOutcome,
};
use storage::repository::{InMemoryResultStore, ResultStore};

//
// ─── MOCK API ──────────────────────────────────────────────────────────────────
//

/// In-process stand-in for the question and validation services.
///
/// Scores answers against a local key and counts calls, so tests can
/// assert the one-request-per-session invariants.
struct MockApi {
    drafts: Vec<QuestionDraft>,
    answer_key: HashMap<String, String>,
    fetch_calls: AtomicUsize,
    validate_calls: AtomicUsize,
    fail_validation: AtomicBool,
}

impl MockApi {
    fn new(subject: &str, kind: QuizKind, count: usize) -> Self {
        let drafts: Vec<_> = (1..=count)
            .map(|i| QuestionDraft {
                id: QuestionId::new(format!("q{i}")),
                prompt: format!("Prompt {i}"),
                options: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                correct_answer: "A".to_string(),
                explanation: format!("Explanation {i}"),
                subject: subject.to_string(),
                kind,
                image: None,
                video_solution_url: None,
            })
            .collect();
        let answer_key = drafts
            .iter()
            .map(|d| (d.id.as_str().to_string(), d.correct_answer.clone()))
            .collect();
        Self {
            drafts,
            answer_key,
            fetch_calls: AtomicUsize::new(0),
            validate_calls: AtomicUsize::new(0),
            fail_validation: AtomicBool::new(false),
        }
    }

    fn empty() -> Self {
        Self {
            drafts: Vec::new(),
            answer_key: HashMap::new(),
            fetch_calls: AtomicUsize::new(0),
            validate_calls: AtomicUsize::new(0),
            fail_validation: AtomicBool::new(false),
        }
    }

    fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuizApi for MockApi {
    async fn fetch_questions(
        &self,
        _subject: &str,
        _kind: QuizKind,
    ) -> Result<Vec<QuestionDraft>, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.drafts.clone())
    }

    async fn validate_answers(
        &self,
        answers: &[AnswerEntry],
    ) -> Result<Vec<ValidatedOutcome>, ApiError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_validation.load(Ordering::SeqCst) {
            return Err(ApiError::HttpStatus {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                message: "validator unavailable".to_string(),
            });
        }
        Ok(answers
            .iter()
            .map(|entry| {
                let correct = self
                    .answer_key
                    .get(entry.question_id.as_str())
                    .cloned()
                    .unwrap_or_default();
                ValidatedOutcome {
                    question_id: Some(entry.question_id.clone()),
                    question: None,
                    options: None,
                    user_answer: Some(entry.user_answer.clone()),
                    is_correct: !entry.user_answer.is_empty() && entry.user_answer == correct,
                    correct_answer: correct,
                    explanation: None,
                    video_solution_url: None,
                }
            })
            .collect())
    }
}

fn controller_with(api: Arc<MockApi>, store: Arc<InMemoryResultStore>, clock: Clock) -> QuizController {
    QuizController::new(clock, api, store)
}

fn shared(session: QuizSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}

//
// ─── SCENARIOS ─────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn manual_submit_scores_three_question_quiz() {
    let api = Arc::new(MockApi::new("Maths", QuizKind::Quiz, 3));
    let store = Arc::new(InMemoryResultStore::new());
    // Submission happens 90 seconds after the session start.
    let submit_at = fixed_now() + chrono::Duration::seconds(90);
    let controller = controller_with(api.clone(), store.clone(), Clock::fixed(submit_at));

    let mut session = controller.load_session("Maths", QuizKind::Quiz).await.unwrap();
    assert_eq!(session.total_secs(), 180);
    session.start(fixed_now()).unwrap();

    session.select_answer("A").unwrap(); // q1 correct
    session.advance();
    session.select_answer("B").unwrap(); // q2 wrong
    // q3 left blank.

    let report_id = controller.submit(&mut session).await.unwrap();
    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(api.validate_calls(), 1);

    let report = store.load(&report_id).await.unwrap();
    assert_eq!(report.time_taken_secs(), 90);
    assert_eq!(report.total(), 3);
    assert_eq!(report.correct_count(), 1);
    assert_eq!(report.outcomes()[2].user_answer, "");
    // Local metadata was merged into the minimal validator response.
    assert_eq!(report.outcomes()[0].prompt, "Prompt 1");
    assert_eq!(report.outcomes()[1].explanation, "Explanation 2");
}

#[tokio::test]
async fn timer_expiry_forces_exactly_one_submission() {
    let api = Arc::new(MockApi::new("Physics", QuizKind::Practice, 5));
    let store = Arc::new(InMemoryResultStore::new());
    let controller = controller_with(api.clone(), store.clone(), Clock::fixed(fixed_now()));

    let mut session = controller
        .load_session("Physics", QuizKind::Practice)
        .await
        .unwrap();
    assert_eq!(session.total_secs(), 600);
    session.start(fixed_now()).unwrap();

    // Run the countdown to expiry without answering anything.
    let mut expired = 0;
    for _ in 0..605 {
        if session.tick() == ClockTick::Expired {
            expired += 1;
        }
    }
    assert_eq!(expired, 1);

    let session = shared(session);
    let report_id = controller.submit_shared(&session).await.unwrap().unwrap();
    // A stale second trigger is a no-op.
    assert_eq!(controller.submit_shared(&session).await.unwrap(), None);
    assert_eq!(api.validate_calls(), 1);

    let report = store.load(&report_id).await.unwrap();
    assert_eq!(report.total(), 5);
    assert_eq!(report.correct_count(), 0);
    assert!(report.outcomes().iter().all(|o| o.user_answer.is_empty()));
}

#[tokio::test]
async fn concurrent_triggers_send_a_single_request() {
    let api = Arc::new(MockApi::new("Maths", QuizKind::Quiz, 2));
    let store = Arc::new(InMemoryResultStore::new());
    let controller = controller_with(api.clone(), store, Clock::fixed(fixed_now()));

    let mut session = controller.load_session("Maths", QuizKind::Quiz).await.unwrap();
    session.start(fixed_now()).unwrap();
    let session = shared(session);

    // Timer expiry and the submit button racing within the same tick.
    let (a, b) = tokio::join!(
        controller.submit_shared(&session),
        controller.submit_shared(&session)
    );
    let winners = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(Option::is_some)
        .count();
    assert_eq!(winners, 1);
    assert_eq!(api.validate_calls(), 1);
    assert_eq!(session.lock().await.state(), SessionState::Completed);
}

#[tokio::test]
async fn empty_question_set_never_starts_a_session() {
    let api = Arc::new(MockApi::empty());
    let store = Arc::new(InMemoryResultStore::new());
    let controller = controller_with(api, store, Clock::fixed(fixed_now()));

    let err = controller.load_session("Latin", QuizKind::Quiz).await.unwrap_err();
    assert!(matches!(err, LoadError::NoContent { .. }));
}

#[tokio::test]
async fn failed_validation_keeps_ledger_and_permits_retry() {
    let api = Arc::new(MockApi::new("Maths", QuizKind::Quiz, 2));
    let store = Arc::new(InMemoryResultStore::new());
    let first_controller = controller_with(
        api.clone(),
        store.clone(),
        Clock::fixed(fixed_now() + chrono::Duration::seconds(30)),
    );

    let mut session = first_controller
        .load_session("Maths", QuizKind::Quiz)
        .await
        .unwrap();
    session.start(fixed_now()).unwrap();
    session.select_answer("A").unwrap();

    api.fail_validation.store(true, Ordering::SeqCst);
    let err = first_controller.submit(&mut session).await.unwrap_err();
    assert!(matches!(err, SubmitError::Validation(_)));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.failure().is_some());
    // The ledger is intact; the session never returns to Running.
    assert_eq!(session.answer_for(&QuestionId::new("q1")), Some("A"));
    assert!(session.select_answer("B").is_err());

    // User-initiated retry, much later; elapsed time stays at 30 s.
    api.fail_validation.store(false, Ordering::SeqCst);
    let retry_controller = controller_with(
        api.clone(),
        store.clone(),
        Clock::fixed(fixed_now() + chrono::Duration::seconds(900)),
    );
    let report_id = retry_controller.submit(&mut session).await.unwrap();
    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(api.validate_calls(), 2);

    let report = store.load(&report_id).await.unwrap();
    assert_eq!(report.time_taken_secs(), 30);
    assert_eq!(report.correct_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn countdown_task_submits_on_expiry_and_stops() {
    let api = Arc::new(MockApi::new("Maths", QuizKind::Quiz, 1));
    let store = Arc::new(InMemoryResultStore::new());
    let controller = controller_with(api.clone(), store, Clock::default());

    let mut session = controller.load_session("Maths", QuizKind::Quiz).await.unwrap();
    assert_eq!(session.total_secs(), 60);
    controller.start(&mut session).unwrap();
    let session = shared(session);

    let clock_task = controller.spawn_clock(Arc::clone(&session));
    tokio::time::sleep(std::time::Duration::from_secs(62)).await;
    clock_task.await.unwrap();

    assert_eq!(session.lock().await.state(), SessionState::Completed);
    assert_eq!(api.validate_calls(), 1);
}

#[tokio::test]
async fn countdown_task_stops_after_manual_submit() {
    let api = Arc::new(MockApi::new("Maths", QuizKind::Quiz, 1));
    let store = Arc::new(InMemoryResultStore::new());
    let controller = controller_with(api.clone(), store, Clock::fixed(fixed_now()));

    let mut session = controller.load_session("Maths", QuizKind::Quiz).await.unwrap();
    session.start(fixed_now()).unwrap();
    let session = shared(session);

    let clock_task = controller.spawn_clock(Arc::clone(&session));
    controller.submit_shared(&session).await.unwrap();

    // The next tick observes a non-running session and the task exits
    // without a second submission.
    clock_task.await.unwrap();
    assert_eq!(api.validate_calls(), 1);
}

#[tokio::test]
async fn stored_report_resolves_repeatedly_for_review() {
    let api = Arc::new(MockApi::new("Maths", QuizKind::Quiz, 2));
    let store = Arc::new(InMemoryResultStore::new());
    let controller = controller_with(api, store, Clock::fixed(fixed_now()));

    let mut session = controller.load_session("Maths", QuizKind::Quiz).await.unwrap();
    session.start(fixed_now()).unwrap();
    let report_id = controller.submit(&mut session).await.unwrap();

    let first = controller.load_report(&report_id).await.unwrap();
    let second = controller.load_report(&report_id).await.unwrap();
    assert_eq!(first, second);

    let missing = controller
        .load_report(&quiz_core::model::ReportId::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(missing, services::ReviewError::NotFound));
}
