use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Could not decode shared `{field}`: {reason}")]
    ConfigDecode { field: &'static str, reason: String },

    #[error(transparent)]
    Generation(#[from] GenerationFailure),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Please enter at least one book title")]
    EmptyInput,

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Response error: {0}")]
    ResponseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Provider returned {status}: {message}")]
    ProviderError { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AWS error: {0}")]
    AwsError(String),

    #[error("AWS service error: {0}")]
    AwsServiceError(String),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoverError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoverError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the errors that reject a run before any request is issued.
    pub fn is_precheck(&self) -> bool {
        matches!(self, CoverError::EmptyInput | CoverError::MissingCredential(_))
    }
}

/// Which half of the pipeline an item failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Description,
    Image,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Description => write!(f, "description"),
            Stage::Image => write!(f, "image"),
        }
    }
}

/// A single failed variation. Batches collect these as warnings and keep going.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Error generating {stage} {variation} for '{title}': {detail}")]
pub struct GenerationFailure {
    pub stage: Stage,
    pub title: String,
    /// 1-based, matching what the user sees.
    pub variation: usize,
    pub detail: String,
}

impl GenerationFailure {
    pub fn new(stage: Stage, title: &str, variation: usize, error: &CoverError) -> Self {
        Self {
            stage,
            title: title.to_string(),
            variation,
            detail: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_failure_message() {
        let failure = GenerationFailure::new(
            Stage::Description,
            "Dune",
            2,
            &CoverError::ProviderError {
                status: 429,
                message: "rate limited".into(),
            },
        );
        assert_eq!(
            failure.to_string(),
            "Error generating description 2 for 'Dune': Provider returned 429: rate limited"
        );
    }

    #[test]
    fn test_precheck_errors() {
        assert!(CoverError::EmptyInput.is_precheck());
        assert!(CoverError::MissingCredential("OPENAI_API_KEY".into()).is_precheck());
        assert!(!CoverError::ResponseError("boom".into()).is_precheck());
    }
}
