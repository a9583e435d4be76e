use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::model::{
    QuestionId, QuestionOutcome, QuizKind, ReportError, ReportId, ResultReport,
};

/// Errors surfaced by result stores.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a scored report.
///
/// Mirrors the domain `ResultReport` so stores can serialize without
/// leaking storage concerns into the domain layer. Field names match the
/// original client's `quiz_solution_*` payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: QuizKind,
    #[serde(rename = "timeTaken")]
    pub time_taken_secs: u64,
    pub results: Vec<OutcomeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub question_id: QuestionId,
    pub question: String,
    pub options: Vec<String>,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_solution_url: Option<String>,
}

impl ReportRecord {
    #[must_use]
    pub fn from_report(report: &ResultReport) -> Self {
        Self {
            subject: report.subject().to_owned(),
            kind: report.kind(),
            time_taken_secs: report.time_taken_secs(),
            results: report
                .outcomes()
                .iter()
                .map(|o| OutcomeRecord {
                    question_id: o.question_id.clone(),
                    question: o.prompt.clone(),
                    options: o.options.clone(),
                    user_answer: o.user_answer.clone(),
                    correct_answer: o.correct_answer.clone(),
                    is_correct: o.is_correct,
                    explanation: o.explanation.clone(),
                    video_solution_url: o.video_solution_url.clone(),
                })
                .collect(),
        }
    }

    /// Convert the record back into a domain `ResultReport`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if the stored outcome list is empty.
    pub fn into_report(self) -> Result<ResultReport, ReportError> {
        let outcomes = self
            .results
            .into_iter()
            .map(|r| QuestionOutcome {
                question_id: r.question_id,
                prompt: r.question,
                options: r.options,
                user_answer: r.user_answer,
                correct_answer: r.correct_answer,
                is_correct: r.is_correct,
                explanation: r.explanation,
                video_solution_url: r.video_solution_url,
            })
            .collect();
        ResultReport::from_persisted(self.subject, self.kind, self.time_taken_secs, outcomes)
    }
}

/// Local persistence contract for scored reports.
///
/// Saving generates a fresh identifier; loading is read-only, so a review
/// screen may resolve the same id any number of times.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist the report under a freshly generated identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the report cannot be stored.
    async fn save(&self, report: &ResultReport) -> Result<ReportId, StorageError>;

    /// Fetch a report by identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no report exists under the id.
    async fn load(&self, id: &ReportId) -> Result<ResultReport, StorageError>;
}

/// Simple in-memory result store for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryResultStore {
    reports: Arc<Mutex<HashMap<ReportId, ResultReport>>>,
}

impl InMemoryResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn save(&self, report: &ResultReport) -> Result<ReportId, StorageError> {
        let id = ReportId::generate();
        let mut guard = self
            .reports
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        guard.insert(id.clone(), report.clone());
        Ok(id)
    }

    async fn load(&self, id: &ReportId) -> Result<ResultReport, StorageError> {
        let guard = self
            .reports
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        guard.get(id).cloned().ok_or(StorageError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_report() -> ResultReport {
        let outcomes = vec![
            QuestionOutcome {
                question_id: QuestionId::new("q1"),
                prompt: "Prompt 1".to_string(),
                options: vec!["A".to_string(), "B".to_string()],
                user_answer: "A".to_string(),
                correct_answer: "A".to_string(),
                is_correct: true,
                explanation: "Because A.".to_string(),
                video_solution_url: Some("https://videos.example/q1".to_string()),
            },
            QuestionOutcome {
                question_id: QuestionId::new("q2"),
                prompt: "Prompt 2".to_string(),
                options: vec!["A".to_string(), "B".to_string()],
                user_answer: String::new(),
                correct_answer: "B".to_string(),
                is_correct: false,
                explanation: String::new(),
                video_solution_url: None,
            },
        ];
        ResultReport::new("Chemistry", QuizKind::Practice, 120, outcomes).unwrap()
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = InMemoryResultStore::new();
        let report = build_report();
        let id = store.save(&report).await.unwrap();
        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded, report);
    }

    #[tokio::test]
    async fn load_does_not_consume_the_report() {
        let store = InMemoryResultStore::new();
        let id = store.save(&build_report()).await.unwrap();
        store.load(&id).await.unwrap();
        // A revisit of the review screen must still resolve.
        assert!(store.load(&id).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemoryResultStore::new();
        let err = store.load(&ReportId::new("missing")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn each_save_gets_a_distinct_id() {
        let store = InMemoryResultStore::new();
        let report = build_report();
        let a = store.save(&report).await.unwrap();
        let b = store.save(&report).await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn record_serializes_with_original_field_names() {
        let record = ReportRecord::from_report(&build_report());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "practice");
        assert_eq!(json["timeTaken"], 120);
        assert_eq!(json["results"][0]["questionId"], "q1");
        assert_eq!(json["results"][0]["isCorrect"], true);
        assert_eq!(json["results"][0]["userAnswer"], "A");
        assert!(json["results"][1].get("videoSolutionUrl").is_none());
    }

    #[test]
    fn record_round_trips_into_report() {
        let report = build_report();
        let record = ReportRecord::from_report(&report);
        let json = serde_json::to_string(&record).unwrap();
        let parsed: ReportRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.into_report().unwrap(), report);
    }
}
