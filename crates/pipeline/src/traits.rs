//! Core traits for the external collaborators.
//!
//! The pipeline never talks to a network service directly: the classifier
//! and the video catalog are reached through these traits so the gRPC and
//! HTTP clients can be swapped for in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;
use model::{RawClassification, VideoDetail, VideoId, VideoSummary};

/// Facial emotion classification service.
///
/// ## Design Note
/// - Implementations must not require a face to be found: a faceless image
///   still yields whatever distribution the model produces.
/// - Scores come back unnormalized; `ClassifierAdapter` turns them into an
///   `EmotionResult`.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Returns the name of this classifier (for logging/debugging)
    fn name(&self) -> &str;

    /// Classify the dominant emotion of an encoded image.
    async fn classify(&self, image: &[u8]) -> Result<RawClassification>;
}

/// Video search and metadata service.
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// Returns the name of this catalog (for logging/debugging)
    fn name(&self) -> &str;

    /// Find up to `max_results` videos matching `query`, most relevant first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<VideoSummary>>;

    /// Fetch metadata for a batch of videos in one call.
    ///
    /// The order of the returned records is not guaranteed to follow `ids`.
    async fn details(&self, ids: &[VideoId]) -> Result<Vec<VideoDetail>>;
}
