//! # Model Crate
//!
//! Shared domain types for the MoodTunes pipeline.
//!
//! ## Main Components
//!
//! - **types**: emotion, track and response types plus the raw records
//!   exchanged with the classifier and the video catalog
//! - **error**: the [`PipelineError`] taxonomy
//! - **duration**: ISO-8601 duration parsing for catalog records
//!
//! ## Example Usage
//!
//! ```ignore
//! use model::{EmotionCategory, parse_duration};
//!
//! let label = EmotionCategory::from_label("happy");
//! let seconds = parse_duration("PT3M30S")?;
//! ```

// Public modules
pub mod duration;
pub mod error;
pub mod types;

// Re-export commonly used types for convenience
pub use duration::parse_duration;
pub use error::{DurationParseError, PipelineError, Result};
pub use types::{
    // Type aliases
    VideoId,
    // Core types
    EmotionCategory,
    EmotionResult,
    RecommendationResponse,
    Track,
    // Collaborator records
    RawClassification,
    VideoDetail,
    VideoSummary,
};
