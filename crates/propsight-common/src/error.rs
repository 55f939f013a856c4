use serde::Serialize;
use thiserror::Error;

/// Infrastructure failures: HTTP client setup, configuration, sandbox policy.
#[derive(Debug, Error)]
pub enum PropsightError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sandbox policy violation: {0}")]
    Sandbox(String),
}

/// Terminal failures of a single resolution request.
///
/// A lookup miss or an unavailable property service is *not* in here: both
/// are recovered by falling through to prediction.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ResolutionError {
    #[error("no input supplied")]
    EmptyInput,

    #[error("invalid structure: {0}")]
    InvalidStructure(String),

    #[error("name could not be resolved to a structure: {0}")]
    NameNotResolved(String),

    #[error("prediction failed: {0}")]
    Prediction(String),
}

impl ResolutionError {
    /// Short machine-readable tag, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolutionError::EmptyInput => "empty_input",
            ResolutionError::InvalidStructure(_) => "invalid_structure",
            ResolutionError::NameNotResolved(_) => "name_not_resolved",
            ResolutionError::Prediction(_) => "prediction",
        }
    }
}
