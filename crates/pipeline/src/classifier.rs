//! Emotion Classifier Adapter.
//!
//! Wraps an [`EmotionClassifier`] and turns its raw label/score output into a
//! typed [`EmotionResult`]:
//! 1. Read the persisted upload
//! 2. Call the classifier under a timeout
//! 3. Reject empty or non-finite distributions
//! 4. Recompute the dominant label from the scores so the result invariant
//!    holds even when the collaborator's own label disagrees

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use model::{EmotionCategory, EmotionResult, PipelineError, RawClassification, Result};
use tracing::{debug, instrument, warn};

use crate::traits::EmotionClassifier;

/// Default upper bound for one classification call
pub const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Normalizes classifier output into [`EmotionResult`]s.
#[derive(Clone)]
pub struct ClassifierAdapter {
    classifier: Arc<dyn EmotionClassifier>,
    timeout: Duration,
}

impl ClassifierAdapter {
    pub fn new(classifier: Arc<dyn EmotionClassifier>) -> Self {
        Self {
            classifier,
            timeout: DEFAULT_CLASSIFY_TIMEOUT,
        }
    }

    /// Configure the per-call timeout (default: 30s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Classify the image stored at `path`.
    #[instrument(skip(self), fields(classifier = self.classifier.name()))]
    pub async fn classify_file(&self, path: &Path) -> Result<EmotionResult> {
        let image = tokio::fs::read(path).await.map_err(|e| {
            warn!("Failed to read upload at {}: {}", path.display(), e);
            PipelineError::Classification(format!("failed to read uploaded image: {}", e))
        })?;
        self.classify(&image).await
    }

    /// Classify an in-memory encoded image.
    pub async fn classify(&self, image: &[u8]) -> Result<EmotionResult> {
        if image.is_empty() {
            return Err(PipelineError::Classification("image is empty".to_string()));
        }

        let raw = match tokio::time::timeout(self.timeout, self.classifier.classify(image)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(PipelineError::Classification(format!("{:#}", e))),
            Err(_) => {
                return Err(PipelineError::Classification(format!(
                    "{} timed out after {:?}",
                    self.classifier.name(),
                    self.timeout
                )));
            }
        };

        let result = normalize(raw)?;
        debug!(
            "Classified image as {} ({:.2})",
            result.label(),
            result.dominant_score()
        );
        Ok(result)
    }
}

/// Convert a raw classifier response into an [`EmotionResult`].
pub fn normalize(raw: RawClassification) -> Result<EmotionResult> {
    let mut scores: BTreeMap<EmotionCategory, f64> = BTreeMap::new();
    for (label, score) in raw.scores {
        if !score.is_finite() {
            return Err(PipelineError::Classification(format!(
                "non-finite score {} for '{}'",
                score, label
            )));
        }
        // Labels differing only by case collapse into one category
        scores
            .entry(EmotionCategory::from_label(&label))
            .and_modify(|existing| *existing = existing.max(score))
            .or_insert(score);
    }

    let reported = EmotionCategory::from_label(&raw.label);
    let result = EmotionResult::from_scores(scores, Some(&reported)).ok_or_else(|| {
        PipelineError::Classification("classifier returned no scores".to_string())
    })?;

    if result.label() != &reported {
        warn!(
            "Classifier reported '{}' but highest score is '{}'; using the latter",
            raw.label,
            result.label()
        );
    }
    Ok(result)
}
