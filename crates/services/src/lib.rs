#![forbid(unsafe_code)]

pub mod api;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod loader;

pub use quiz_core::Clock;

pub use api::{HttpQuizApi, QuizApi, ValidatedOutcome};
pub use controller::{QuizController, SharedSession};
pub use credentials::{CredentialProvider, EnvCredentials, StaticToken};
pub use error::{ApiError, LoadError, ReviewError, SubmitError};
pub use gateway::ScoringGateway;
pub use loader::QuestionLoader;
