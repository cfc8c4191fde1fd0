//! Error types shared by every stage of the recommendation pipeline.
//!
//! Every failure that can abort an orchestration run is one of the
//! [`PipelineError`] variants. The transport boundary decides how much of
//! this taxonomy it exposes; internally the kind is always preserved.

use thiserror::Error;

/// Errors that can abort an orchestration run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The upload was missing, empty or unreadable as a form field
    #[error("Invalid upload: {0}")]
    Validation(String),

    /// The classifier could not produce a score distribution
    #[error("Emotion classification failed: {0}")]
    Classification(String),

    /// The catalog returned a duration that is not valid ISO-8601
    #[error(transparent)]
    DurationParse(#[from] DurationParseError),

    /// Network, quota or auth failure on a catalog call
    #[error("Video catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// The upload could not be written to request-scoped storage
    #[error("Failed to persist upload: {0}")]
    TransientStorage(#[from] std::io::Error),
}

impl PipelineError {
    /// Stable tag for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Classification(_) => "ClassificationError",
            Self::DurationParse(_) => "DurationParseError",
            Self::CatalogUnavailable(_) => "CatalogUnavailableError",
            Self::TransientStorage(_) => "TransientStorageError",
        }
    }
}

/// A catalog duration string that could not be converted to seconds
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid ISO-8601 duration {input:?}: {reason}")]
pub struct DurationParseError {
    pub input: String,
    pub reason: String,
}

impl DurationParseError {
    pub fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results in the pipeline
pub type Result<T> = std::result::Result<T, PipelineError>;
