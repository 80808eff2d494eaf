use thiserror::Error;

/// Operator-facing failures. Resolution misses are not errors; they travel as
/// [`crate::types::card::UnresolvedReason`] and end up in the reply text.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Fetch failed: {0}")]
    Fetch(String),
    #[error("Post failed: {0}")]
    Post(String),
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for BotError {
    fn from(error: reqwest::Error) -> Self {
        BotError::Fetch(error.to_string())
    }
}

impl From<serde_json::Error> for BotError {
    fn from(error: serde_json::Error) -> Self {
        BotError::MalformedInput(error.to_string())
    }
}

pub type BotResult<T> = Result<T, BotError>;

#[cfg(test)]
#[path = "tests/errors_tests.rs"]
mod tests;
