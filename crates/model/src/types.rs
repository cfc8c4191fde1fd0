//! Core domain types for the emotion-to-music pipeline.
//!
//! - [`EmotionCategory`] / [`EmotionResult`]: what the classifier saw
//! - [`Track`]: one playable recommendation
//! - [`RecommendationResponse`]: the all-or-nothing payload returned per request
//! - [`RawClassification`], [`VideoSummary`], [`VideoDetail`]: records exchanged
//!   with the external collaborators before normalization

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// Catalog identifier of a video (e.g. `dQw4w9WgXcQ`)
pub type VideoId = String;

// =============================================================================
// Emotion Types
// =============================================================================

/// Emotion categories the classifier supports.
///
/// Labels outside the known set are kept verbatim in [`EmotionCategory::Unknown`]
/// so the query mapper can route them to its fallback phrase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmotionCategory {
    Happy,
    Sad,
    Angry,
    Fear,
    Surprise,
    Disgust,
    Neutral,
    Unknown(String),
}

impl EmotionCategory {
    /// Every category with a dedicated query table, in display order.
    pub const KNOWN: [EmotionCategory; 7] = [
        EmotionCategory::Happy,
        EmotionCategory::Sad,
        EmotionCategory::Angry,
        EmotionCategory::Fear,
        EmotionCategory::Surprise,
        EmotionCategory::Disgust,
        EmotionCategory::Neutral,
    ];

    /// Interpret a classifier label. Matching ignores case and surrounding
    /// whitespace; anything else becomes `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "happy" => Self::Happy,
            "sad" => Self::Sad,
            "angry" => Self::Angry,
            "fear" => Self::Fear,
            "surprise" => Self::Surprise,
            "disgust" => Self::Disgust,
            "neutral" => Self::Neutral,
            _ => Self::Unknown(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Fear => "fear",
            Self::Surprise => "surprise",
            Self::Disgust => "disgust",
            Self::Neutral => "neutral",
            Self::Unknown(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for EmotionCategory {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<EmotionCategory> for String {
    fn from(category: EmotionCategory) -> Self {
        match category {
            EmotionCategory::Unknown(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EmotionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized classification of one image.
///
/// Invariant: `label` is the key with the highest value in `raw_scores` and
/// `dominant_score` is that value. The only constructor, [`EmotionResult::from_scores`],
/// enforces it, so the fields stay private.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionResult {
    #[serde(rename = "type")]
    label: EmotionCategory,
    dominant_score: f64,
    raw_scores: BTreeMap<EmotionCategory, f64>,
}

impl EmotionResult {
    /// Build a result from a full score distribution.
    ///
    /// When several categories share the maximum, `preferred` wins if it is
    /// one of them; otherwise the first in category order is taken.
    /// Returns `None` for an empty distribution.
    pub fn from_scores(
        raw_scores: BTreeMap<EmotionCategory, f64>,
        preferred: Option<&EmotionCategory>,
    ) -> Option<Self> {
        let max = raw_scores
            .values()
            .copied()
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))?;

        let label = preferred
            .filter(|p| raw_scores.get(*p) == Some(&max))
            .cloned()
            .or_else(|| {
                raw_scores
                    .iter()
                    .find(|(_, v)| **v == max)
                    .map(|(k, _)| k.clone())
            })?;

        Some(Self {
            label,
            dominant_score: max,
            raw_scores,
        })
    }

    pub fn label(&self) -> &EmotionCategory {
        &self.label
    }

    pub fn dominant_score(&self) -> f64 {
        self.dominant_score
    }

    pub fn raw_scores(&self) -> &BTreeMap<EmotionCategory, f64> {
        &self.raw_scores
    }
}

// =============================================================================
// Recommendation Types
// =============================================================================

/// A playable recommendation built from one catalog video.
///
/// The catalog supplies neither album nor genre, so `album` is always `None`
/// and `genres` always empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: VideoId,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub cover_image_url: String,
    pub genres: Vec<String>,
    #[serde(alias = "duration")]
    pub duration_seconds: f64,
    pub url: String,
}

/// Payload returned for one request: either both stages succeeded, or only
/// the generic error shape is produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecommendationResponse {
    Success {
        emotion: EmotionResult,
        songs: Vec<Track>,
    },
    Failure {
        error: String,
        details: String,
    },
}

impl RecommendationResponse {
    /// The user-visible error string for every failure kind.
    pub const GENERIC_ERROR: &'static str = "Internal Server Error";

    pub fn failure(details: impl Into<String>) -> Self {
        Self::Failure {
            error: Self::GENERIC_ERROR.to_string(),
            details: details.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

// =============================================================================
// Collaborator Records
// =============================================================================

/// Unnormalized output of the classification collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct RawClassification {
    pub label: String,
    pub scores: HashMap<String, f64>,
}

/// One hit from the catalog's search call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoSummary {
    pub id: VideoId,
}

/// One record from the catalog's batched details call
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetail {
    pub id: VideoId,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: String,
    pub duration_iso8601: String,
}
