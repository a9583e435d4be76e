use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use crate::model::ids::QuestionId;

//
// ─── QUIZ KIND ─────────────────────────────────────────────────────────────────
//

/// Session flavor, which determines the per-question time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizKind {
    Quiz,
    Practice,
}

impl QuizKind {
    /// Seconds allotted per question for this kind of session.
    #[must_use]
    pub fn seconds_per_question(self) -> u64 {
        match self {
            QuizKind::Quiz => 60,
            QuizKind::Practice => 120,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizKind::Quiz => "quiz",
            QuizKind::Practice => "practice",
        }
    }
}

impl Default for QuizKind {
    fn default() -> Self {
        QuizKind::Quiz
    }
}

impl fmt::Display for QuizKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseQuizKindError {
    raw: String,
}

impl fmt::Display for ParseQuizKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown quiz kind: {}", self.raw)
    }
}

impl std::error::Error for ParseQuizKindError {}

impl FromStr for QuizKind {
    type Err = ParseQuizKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quiz" => Ok(QuizKind::Quiz),
            "practice" => Ok(QuizKind::Practice),
            other => Err(ParseQuizKindError {
                raw: other.to_string(),
            }),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has an empty prompt")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id} has {count} options, at least 2 required")]
    TooFewOptions { id: QuestionId, count: usize },

    #[error("question {id} has an empty correct answer")]
    EmptyCorrectAnswer { id: QuestionId },

    #[error("question {id} has an invalid {field} url: {raw}")]
    InvalidUrl {
        id: QuestionId,
        field: &'static str,
        raw: String,
    },
}

/// Unvalidated question as delivered by the question service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub subject: String,
    pub kind: QuizKind,
    pub image: Option<String>,
    pub video_solution_url: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, fewer than two
    /// options are present, the correct answer is blank, or an optional
    /// media reference is not a parseable URL.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id: self.id });
        }
        if self.options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                id: self.id,
                count: self.options.len(),
            });
        }
        if self.correct_answer.trim().is_empty() {
            return Err(QuestionError::EmptyCorrectAnswer { id: self.id });
        }

        let image = parse_optional_url(&self.id, "image", self.image)?;
        let video_solution_url =
            parse_optional_url(&self.id, "video solution", self.video_solution_url)?;

        Ok(Question {
            id: self.id,
            prompt: self.prompt,
            options: self.options,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            subject: self.subject,
            kind: self.kind,
            image,
            video_solution_url,
        })
    }
}

fn parse_optional_url(
    id: &QuestionId,
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<Url>, QuestionError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    // Servers sometimes hand back a present-but-blank field.
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Url::parse(&raw)
        .map(Some)
        .map_err(|_| QuestionError::InvalidUrl {
            id: id.clone(),
            field,
            raw,
        })
}

/// A validated question, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: String,
    subject: String,
    kind: QuizKind,
    image: Option<Url>,
    video_solution_url: Option<Url>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn kind(&self) -> QuizKind {
        self.kind
    }

    #[must_use]
    pub fn image(&self) -> Option<&Url> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn video_solution_url(&self) -> Option<&Url> {
        self.video_solution_url.as_ref()
    }

    /// Whether the given option value is one of this question's options.
    #[must_use]
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }
}
