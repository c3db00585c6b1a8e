use thiserror::Error;

#[derive(Debug, Error)]
pub enum KreatError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("upstream rate limit: {0}")]
    RateLimited(String),
    #[error("{}", format_missing(.missing))]
    ResponseFormat { missing: Vec<String> },
    #[error("invalid input: {0}")]
    Input(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

fn format_missing(missing: &[String]) -> String {
    missing
        .iter()
        .map(|key| format!("could not extract field {key}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl KreatError {
    /// Upstream failures are worth re-submitting; everything else needs a change first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::RateLimited(_))
    }
}

impl From<std::io::Error> for KreatError {
    fn from(err: std::io::Error) -> Self {
        Self::Runtime(err.to_string())
    }
}

impl From<serde_json::Error> for KreatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KreatError>;
