use std::env;

/// Supplies the bearer token attached to question-service calls.
///
/// Returning `None` means the client is unauthenticated; callers fail
/// with an authorization error before any request goes out.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Reads the token from the `QUIZ_API_TOKEN` environment variable.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CredentialProvider for EnvCredentials {
    fn bearer_token(&self) -> Option<String> {
        let token = env::var("QUIZ_API_TOKEN").ok()?;
        if token.trim().is_empty() {
            return None;
        }
        Some(token)
    }
}

/// Fixed token, mainly for tests and scripted runs.
#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        if self.token.trim().is_empty() {
            return None;
        }
        Some(self.token.clone())
    }
}
