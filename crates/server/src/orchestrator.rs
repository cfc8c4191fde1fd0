//! # Request Orchestrator
//!
//! Runs one emotion request end to end:
//! 1. Validate the upload
//! 2. Persist it to request-scoped storage
//! 3. Classify the stored image
//! 4. Map the emotion to a search phrase
//! 5. Fetch track recommendations for the phrase
//! 6. Compose the response (both parts, or the generic error shape)
//!
//! The temporary file is removed as soon as classification finishes, and
//! on every early return.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result as AnyResult};
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use catalog_client::YouTubeCatalog;
use emotion_client::EmotionServiceClient;
use model::{EmotionResult, PipelineError, RecommendationResponse, Result, Track};
use pipeline::{ClassifierAdapter, DEFAULT_LIMIT, QueryMapper, RecommendationEngine};

use crate::config::AppConfig;
use crate::storage::TransientStorage;

/// Coordinates classification and recommendation for one upload at a time.
///
/// Holds no per-request state, so one instance serves any number of
/// concurrent requests.
#[derive(Clone)]
pub struct RequestOrchestrator {
    storage: TransientStorage,
    classifier: ClassifierAdapter,
    mapper: QueryMapper,
    engine: RecommendationEngine,
    result_limit: usize,
}

impl RequestOrchestrator {
    pub fn new(
        storage: TransientStorage,
        classifier: ClassifierAdapter,
        mapper: QueryMapper,
        engine: RecommendationEngine,
    ) -> Self {
        Self {
            storage,
            classifier,
            mapper,
            engine,
            result_limit: DEFAULT_LIMIT,
        }
    }

    /// Number of tracks requested per run (default: 30)
    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    /// Wire the production collaborators from configuration.
    ///
    /// The model service is connected lazily so the server can come up
    /// before it is ready.
    pub fn from_config(config: &AppConfig) -> AnyResult<Self> {
        let emotion_client = EmotionServiceClient::connect_lazy(
            config.classifier.endpoint.clone(),
            config.classifier.timeout(),
        )
        .context("Failed to configure classification client")?;

        let catalog = YouTubeCatalog::new(config.catalog.api_key.clone(), config.catalog.timeout())
            .context("Failed to configure video catalog client")?
            .with_base_url(config.catalog.base_url.clone());

        let classifier =
            ClassifierAdapter::new(Arc::new(emotion_client)).with_timeout(config.classifier.timeout());
        let engine = RecommendationEngine::new(Arc::new(catalog)).with_timeout(config.catalog.timeout());

        Ok(Self::new(
            TransientStorage::new(config.storage.temp_dir()),
            classifier,
            QueryMapper::new(),
            engine,
        )
        .with_result_limit(config.recommendations.limit))
    }

    /// Handle one upload and produce the response payload.
    ///
    /// Never fails: every error is logged with its kind and folded into
    /// the generic error shape.
    pub async fn handle_request(&self, upload: Vec<u8>) -> RecommendationResponse {
        let request_id = Uuid::new_v4();
        let span = info_span!("emotion_request", %request_id);

        async move {
            match self.run(request_id, upload).await {
                Ok((emotion, songs)) => RecommendationResponse::Success { emotion, songs },
                Err(e) => self.fail(e),
            }
        }
        .instrument(span)
        .await
    }

    /// Convert a pipeline error into the response the caller sees.
    pub fn fail(&self, err: PipelineError) -> RecommendationResponse {
        error!(kind = err.kind(), "Error processing emotion request: {}", err);
        RecommendationResponse::failure(err.to_string())
    }

    /// Typed variant of [`handle_request`](Self::handle_request).
    pub async fn run(&self, request_id: Uuid, upload: Vec<u8>) -> Result<(EmotionResult, Vec<Track>)> {
        let start_time = Instant::now();

        if upload.is_empty() {
            return Err(PipelineError::Validation("uploaded file is empty".to_string()));
        }
        info!("Received upload of {} bytes", upload.len());

        let image = self.storage.persist(request_id, upload).await?;
        let emotion = self.classifier.classify_file(image.path()).await;
        drop(image);
        let emotion = emotion?;
        info!(
            "Detected emotion {} ({:.2})",
            emotion.label(),
            emotion.dominant_score()
        );

        let query = self.mapper.map_to_query(emotion.label());
        info!("Mapped {} to search phrase '{}'", emotion.label(), query);

        let songs = self.engine.recommend(query, self.result_limit).await;
        let outcome = compose(emotion, songs);

        info!("Request finished in {:.2?}", start_time.elapsed());
        outcome
    }
}

/// All-or-nothing: a recommendation failure discards the emotion result.
fn compose(
    emotion: EmotionResult,
    songs: Result<Vec<Track>>,
) -> Result<(EmotionResult, Vec<Track>)> {
    match songs {
        Ok(songs) => {
            debug!("Composed response with {} songs", songs.len());
            Ok((emotion, songs))
        }
        Err(e) => {
            debug!("Discarding emotion {} after recommendation failure", emotion.label());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use model::{EmotionCategory, RawClassification, VideoDetail, VideoId, VideoSummary};
    use pipeline::{EmotionClassifier, FixedPicker, VideoCatalog};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    struct FakeClassifier {
        fail: bool,
        seen: Mutex<Vec<Vec<u8>>>,
    }

    impl FakeClassifier {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl EmotionClassifier for FakeClassifier {
        fn name(&self) -> &str {
            "FakeClassifier"
        }

        async fn classify(&self, image: &[u8]) -> anyhow::Result<RawClassification> {
            self.seen.lock().unwrap().push(image.to_vec());
            if self.fail {
                return Err(anyhow!("model crashed"));
            }
            Ok(RawClassification {
                label: "happy".to_string(),
                scores: HashMap::from([
                    ("happy".to_string(), 87.2),
                    ("sad".to_string(), 4.1),
                    ("neutral".to_string(), 8.7),
                ]),
            })
        }
    }

    struct FakeCatalog {
        details_error: Option<&'static str>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn new(details_error: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                details_error,
                queries: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl VideoCatalog for FakeCatalog {
        fn name(&self) -> &str {
            "FakeCatalog"
        }

        async fn search(&self, query: &str, _max_results: usize) -> anyhow::Result<Vec<VideoSummary>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(["v1", "v2", "v3"]
                .into_iter()
                .map(|id| VideoSummary { id: id.to_string() })
                .collect())
        }

        async fn details(&self, ids: &[VideoId]) -> anyhow::Result<Vec<VideoDetail>> {
            if let Some(msg) = self.details_error {
                return Err(anyhow!(msg));
            }
            let durations = [("v1", "PT2M0S"), ("v2", "PT3M15S"), ("v3", "PT0M45S")];
            Ok(durations
                .into_iter()
                .filter(|(id, _)| ids.iter().any(|wanted| wanted == id))
                .map(|(id, duration)| VideoDetail {
                    id: id.to_string(),
                    title: format!("Song {id}"),
                    channel_title: "Artist".to_string(),
                    thumbnail_url: format!("https://img/{id}.jpg"),
                    duration_iso8601: duration.to_string(),
                })
                .collect())
        }
    }

    fn orchestrator(
        dir: &Path,
        classifier: Arc<FakeClassifier>,
        catalog: Arc<FakeCatalog>,
    ) -> RequestOrchestrator {
        RequestOrchestrator::new(
            TransientStorage::new(dir),
            ClassifierAdapter::new(classifier),
            QueryMapper::with_picker(FixedPicker(0)),
            RecommendationEngine::new(catalog),
        )
    }

    fn is_empty_dir(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    // ============================================================================
    // Tests
    // ============================================================================

    #[tokio::test]
    async fn test_run_returns_emotion_and_songs() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = FakeClassifier::new(false);
        let catalog = FakeCatalog::new(None);
        let orch = orchestrator(dir.path(), classifier.clone(), catalog.clone());

        let (emotion, songs) = orch.run(Uuid::new_v4(), b"face".to_vec()).await.unwrap();

        assert_eq!(emotion.label(), &EmotionCategory::Happy);
        assert_eq!(emotion.dominant_score(), 87.2);
        let durations: Vec<f64> = songs.iter().map(|s| s.duration_seconds).collect();
        assert_eq!(durations, vec![120.0, 195.0, 45.0]);
        assert_eq!(catalog.queries.lock().unwrap().as_slice(), ["ppstar"]);
        assert_eq!(classifier.seen.lock().unwrap().as_slice(), [b"face".to_vec()]);
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_handle_request_serializes_success_shape() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), FakeClassifier::new(false), FakeCatalog::new(None));

        let response = orch.handle_request(b"face".to_vec()).await;
        assert!(response.is_success());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["emotion"]["type"], "happy");
        assert_eq!(json["emotion"]["dominantScore"], 87.2);
        assert_eq!(json["emotion"]["rawScores"]["sad"], 4.1);
        assert_eq!(json["songs"].as_array().unwrap().len(), 3);
        assert_eq!(json["songs"][0]["url"], "https://www.youtube.com/watch?v=v1");
    }

    #[tokio::test]
    async fn test_catalog_failure_discards_emotion() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            dir.path(),
            FakeClassifier::new(false),
            FakeCatalog::new(Some("quotaExceeded")),
        );

        let response = orch.handle_request(b"face".to_vec()).await;
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "error": "Internal Server Error",
                "details": "Video catalog unavailable: details call failed: quotaExceeded",
            })
        );
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_classifier_failure_skips_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FakeCatalog::new(None);
        let orch = orchestrator(dir.path(), FakeClassifier::new(true), catalog.clone());

        let err = orch.run(Uuid::new_v4(), b"face".to_vec()).await.unwrap_err();

        assert_eq!(err.kind(), "ClassificationError");
        assert!(err.to_string().contains("model crashed"));
        assert!(catalog.queries.lock().unwrap().is_empty());
        assert!(is_empty_dir(dir.path()));
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected_before_storage() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = FakeClassifier::new(false);
        let orch = orchestrator(dir.path(), classifier.clone(), FakeCatalog::new(None));

        let err = orch.run(Uuid::new_v4(), Vec::new()).await.unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert!(classifier.seen.lock().unwrap().is_empty());

        let response = orch.handle_request(Vec::new()).await;
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_result_limit_caps_songs() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path(), FakeClassifier::new(false), FakeCatalog::new(None))
            .with_result_limit(2);

        let (_, songs) = orch.run(Uuid::new_v4(), b"face".to_vec()).await.unwrap();
        let ids: Vec<&str> = songs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2"]);
    }

    #[test]
    fn test_compose_is_all_or_nothing() {
        let emotion = EmotionResult::from_scores(
            [(EmotionCategory::Sad, 90.0)].into_iter().collect(),
            None,
        )
        .unwrap();

        let ok = compose(emotion.clone(), Ok(Vec::new())).unwrap();
        assert_eq!(ok.0, emotion);

        let err = compose(
            emotion,
            Err(PipelineError::CatalogUnavailable("down".to_string())),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "CatalogUnavailableError");
    }

    #[tokio::test]
    async fn test_from_config_requires_api_key() {
        let config = AppConfig::default();
        assert!(RequestOrchestrator::from_config(&config).is_err());
    }
}
