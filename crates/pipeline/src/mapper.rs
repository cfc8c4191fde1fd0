//! Emotion-to-Query Mapper.
//!
//! Maps an emotion category to a catalog search phrase. Each known category
//! has a fixed list of candidate phrases and one is picked per call; unknown
//! labels always map to [`FALLBACK_QUERY`]. The mapper never fails.

use std::sync::Arc;

use model::EmotionCategory;
use rand::Rng;

/// Phrase used for any label outside the known categories
pub const FALLBACK_QUERY: &str = "relaxing music";

/// Candidate search phrases for a category.
///
/// Unknown categories have no candidates.
pub fn candidate_phrases(category: &EmotionCategory) -> &'static [&'static str] {
    match category {
        EmotionCategory::Happy => &["ppstar", "laa cima cartel", "ride with us"],
        EmotionCategory::Sad => &["tena", "tena sad songs", "npn sad songs", "dg te tha nirk"],
        EmotionCategory::Angry => &["angry rock music"],
        EmotionCategory::Fear => &["dark ambient music"],
        EmotionCategory::Surprise => &["experimental music"],
        EmotionCategory::Disgust => &["grunge music"],
        EmotionCategory::Neutral => &["lofi chill beats"],
        EmotionCategory::Unknown(_) => &[],
    }
}

/// Chooses one index out of `len` candidates (`len` is never zero).
pub trait PhrasePicker: Send + Sync {
    fn pick(&self, len: usize) -> usize;
}

/// Uniform random choice, the production picker.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl PhrasePicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Always picks the same position (wrapped to the list length).
///
/// Makes responses reproducible in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl PhrasePicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}

#[derive(Clone)]
pub struct QueryMapper {
    picker: Arc<dyn PhrasePicker>,
}

impl QueryMapper {
    /// Mapper with uniform random phrase selection.
    pub fn new() -> Self {
        Self::with_picker(RandomPicker)
    }

    pub fn with_picker(picker: impl PhrasePicker + 'static) -> Self {
        Self {
            picker: Arc::new(picker),
        }
    }

    /// Select a search phrase for `category`.
    pub fn map_to_query(&self, category: &EmotionCategory) -> &'static str {
        let phrases = candidate_phrases(category);
        if phrases.is_empty() {
            return FALLBACK_QUERY;
        }
        let index = self.picker.pick(phrases.len()).min(phrases.len() - 1);
        phrases[index]
    }

    /// Same as [`QueryMapper::map_to_query`] for a raw label string.
    pub fn map_label(&self, label: &str) -> &'static str {
        self.map_to_query(&EmotionCategory::from_label(label))
    }
}

impl Default for QueryMapper {
    fn default() -> Self {
        Self::new()
    }
}
