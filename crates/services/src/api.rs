use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use quiz_core::model::{AnswerEntry, QuestionDraft, QuestionId, QuizKind};

use crate::credentials::CredentialProvider;
use crate::error::ApiError;

/// Upper bound on a single request; session-level timing is the
/// countdown's job.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-question outcome as returned by the validation service.
///
/// Only correctness and the correct answer are guaranteed; everything
/// else is optional and gets backfilled from local question metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedOutcome {
    #[serde(default)]
    pub question_id: Option<QuestionId>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub video_solution_url: Option<String>,
}

/// Transport-agnostic contract for the external question and validation
/// services. One request per call; retries are the caller's decision.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// Fetch the questions for a (subject, kind) key.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on missing credentials, transport failure, or a
    /// non-success response. An empty list is a valid outcome.
    async fn fetch_questions(
        &self,
        subject: &str,
        kind: QuizKind,
    ) -> Result<Vec<QuestionDraft>, ApiError>;

    /// Submit the ordered answer payload for server-side validation.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on missing credentials, transport failure, or a
    /// non-success response.
    async fn validate_answers(
        &self,
        answers: &[AnswerEntry],
    ) -> Result<Vec<ValidatedOutcome>, ApiError>;
}

//
// ─── HTTP CLIENT ───────────────────────────────────────────────────────────────
//

/// `reqwest`-backed implementation of `QuizApi`.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpQuizApi {
    /// Build a client for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn token(&self) -> Result<String, ApiError> {
        self.credentials.bearer_token().ok_or(ApiError::MissingToken)
    }

    async fn error_from(response: Response) -> ApiError {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        ApiError::HttpStatus { status, message }
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn fetch_questions(
        &self,
        subject: &str,
        kind: QuizKind,
    ) -> Result<Vec<QuestionDraft>, ApiError> {
        let token = self.token()?;
        let url = format!("{}/questions/getquestions", self.base_url);

        let response = self
            .client
            .get(url)
            .query(&[("subject", subject), ("type", kind.as_str())])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: QuestionsResponse = response.json().await?;
        Ok(body
            .questions
            .into_iter()
            .map(QuestionWire::into_draft)
            .collect())
    }

    async fn validate_answers(
        &self,
        answers: &[AnswerEntry],
    ) -> Result<Vec<ValidatedOutcome>, ApiError> {
        let token = self.token()?;
        let url = format!("{}/questions/validateanswer", self.base_url);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&ValidateRequest { answers })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: ValidateResponse = response.json().await?;
        Ok(body.results)
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionsResponse {
    questions: Vec<QuestionWire>,
}

// Field names follow the question service, `_id` and the capitalized
// `VideoSolutionUrl` included.
#[derive(Debug, Deserialize)]
struct QuestionWire {
    #[serde(rename = "_id")]
    id: String,
    question: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(rename = "correctAnswer", default)]
    correct_answer: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    subject: String,
    #[serde(rename = "type", default)]
    kind: QuizKind,
    #[serde(rename = "questionImage", default)]
    question_image: Option<String>,
    #[serde(rename = "VideoSolutionUrl", default)]
    video_solution_url: Option<String>,
}

impl QuestionWire {
    fn into_draft(self) -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(self.id),
            prompt: self.question,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            subject: self.subject,
            kind: self.kind,
            image: self.question_image,
            video_solution_url: self.video_solution_url,
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    answers: &'a [AnswerEntry],
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    results: Vec<ValidatedOutcome>,
}
