//! Emotion classification and track recommendation pipeline.
//!
//! This crate provides:
//! - Collaborator traits for the classifier and the video catalog
//! - ClassifierAdapter for normalizing classifier output
//! - QueryMapper for turning an emotion into a search phrase
//! - RecommendationEngine for turning a search phrase into tracks
//!
//! ## Architecture
//! A request flows through the stages in order:
//! 1. ClassifierAdapter produces an `EmotionResult` from the uploaded image
//! 2. QueryMapper picks a search phrase for the dominant emotion
//! 3. RecommendationEngine searches the catalog and enriches the hits
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{ClassifierAdapter, QueryMapper, RecommendationEngine, DEFAULT_LIMIT};
//!
//! let adapter = ClassifierAdapter::new(classifier);
//! let mapper = QueryMapper::new();
//! let engine = RecommendationEngine::new(catalog);
//!
//! let emotion = adapter.classify_file(&path).await?;
//! let query = mapper.map_to_query(emotion.label());
//! let tracks = engine.recommend(query, DEFAULT_LIMIT).await?;
//! ```

pub mod classifier;
pub mod mapper;
pub mod recommender;
pub mod traits;

// Re-export main types
pub use classifier::ClassifierAdapter;
pub use mapper::{FixedPicker, PhrasePicker, QueryMapper, RandomPicker, FALLBACK_QUERY};
pub use recommender::{RecommendationEngine, DEFAULT_LIMIT};
pub use traits::{EmotionClassifier, VideoCatalog};
