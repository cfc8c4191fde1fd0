//! YouTube Data API client
//!
//! Implements the two catalog calls the recommendation engine needs:
//! - `search.list` restricted to videos, returning identifiers
//! - `videos.list` with `snippet` and `contentDetails`, returning title,
//!   channel, thumbnail and ISO-8601 duration for a batch of identifiers

use std::time::Duration;

use async_trait::async_trait;
use model::{VideoDetail, VideoId, VideoSummary};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const USER_AGENT: &str = concat!("moodtunes/", env!("CARGO_PKG_VERSION"));

/// The API rejects `maxResults` above this value
pub const MAX_RESULTS_LIMIT: usize = 50;

/// Catalog client errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing API key")]
    MissingApiKey,
}

// Wire types

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    /// Best available cover: high, then medium, then default.
    fn best_url(self) -> String {
        self.high
            .or(self.medium)
            .or(self.default)
            .map(|t| t.url)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// YouTube Data API v3 client
#[derive(Clone)]
pub struct YouTubeCatalog {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeCatalog {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CatalogError::MissingApiKey);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Point the client at another API root (mirrors, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Search for videos matching `query`, most relevant first.
    pub async fn search_videos(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<VideoSummary>, CatalogError> {
        let max_results = max_results.clamp(1, MAX_RESULTS_LIMIT);
        debug!(query = query, max_results = max_results, "Searching catalog");

        let params = [
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("q", query.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        let response: SearchResponse = self.get_json("search", &params).await?;

        // Channels and playlists carry no videoId
        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .map(|id| VideoSummary { id })
            .collect())
    }

    /// Fetch snippet and content details for a batch of videos.
    pub async fn video_details(&self, ids: &[VideoId]) -> Result<Vec<VideoDetail>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = ids.len(), "Fetching video details");

        let params = [
            ("part", "contentDetails,snippet".to_string()),
            ("id", ids.join(",")),
        ];
        let response: VideoListResponse = self.get_json("videos", &params).await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| VideoDetail {
                id: item.id,
                title: item.snippet.title,
                channel_title: item.snippet.channel_title,
                thumbnail_url: item.snippet.thumbnails.best_url(),
                duration_iso8601: item.content_details.duration,
            })
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            // Strip the URL so the API key never reaches the logs
            .map_err(|e| CatalogError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(status = status.as_u16(), "Catalog {} call failed: {}", endpoint, message);
            return Err(CatalogError::ApiError(status.as_u16(), message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::ParseError(e.without_url().to_string()))
    }
}

#[async_trait]
impl pipeline::VideoCatalog for YouTubeCatalog {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn search(&self, query: &str, max_results: usize) -> anyhow::Result<Vec<VideoSummary>> {
        Ok(self.search_videos(query, max_results).await?)
    }

    async fn details(&self, ids: &[VideoId]) -> anyhow::Result<Vec<VideoDetail>> {
        Ok(self.video_details(ids).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    const TEST_KEY: &str = "test-key";

    // ============================================================================
    // Mock catalog server
    // ============================================================================

    fn unauthorized() -> (StatusCode, Json<Value>) {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": 400, "message": "API key not valid."}})),
        )
    }

    async fn search(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        if params.get("key").map(String::as_str) != Some(TEST_KEY) {
            return unauthorized();
        }
        if params.get("q").map(String::as_str) == Some("quota") {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({"error": {"code": 403, "message": "quotaExceeded"}})),
            );
        }
        let max: usize = params["maxResults"].parse().unwrap();
        let items: Vec<Value> = vec![
            json!({"id": {"kind": "youtube#video", "videoId": "v1"}}),
            json!({"id": {"kind": "youtube#channel", "channelId": "c1"}}),
            json!({"id": {"kind": "youtube#video", "videoId": "v2"}}),
            json!({"id": {"kind": "youtube#video", "videoId": "v3"}}),
        ]
        .into_iter()
        .take(max + 1)
        .collect();
        (StatusCode::OK, Json(json!({ "items": items, "echoMax": max })))
    }

    async fn videos(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        if params.get("key").map(String::as_str) != Some(TEST_KEY) {
            return unauthorized();
        }
        assert_eq!(params["part"], "contentDetails,snippet");
        let items: Vec<Value> = params["id"]
            .split(',')
            .rev()
            .map(|id| {
                let thumbnails = if id == "v2" {
                    json!({"default": {"url": format!("https://img/{id}/default.jpg")}})
                } else {
                    json!({
                        "default": {"url": format!("https://img/{id}/default.jpg")},
                        "high": {"url": format!("https://img/{id}/high.jpg")}
                    })
                };
                json!({
                    "id": id,
                    "snippet": {
                        "title": format!("Song {id}"),
                        "channelTitle": "Artist",
                        "thumbnails": thumbnails
                    },
                    "contentDetails": {"duration": "PT3M30S"}
                })
            })
            .collect();
        (StatusCode::OK, Json(json!({ "items": items })))
    }

    /// Start a mock catalog on a random port
    async fn start_mock_catalog() -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock catalog");
        let addr = listener.local_addr().expect("Failed to get local address");

        let app = Router::new()
            .route("/search", get(search))
            .route("/videos", get(videos));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock catalog failed");
        });

        (format!("http://{}/", addr), handle)
    }

    fn client(base_url: &str, key: &str) -> YouTubeCatalog {
        YouTubeCatalog::new(key, Duration::from_secs(5))
            .expect("Failed to build client")
            .with_base_url(base_url)
    }

    // ============================================================================
    // Tests
    // ============================================================================

    #[tokio::test]
    async fn test_search_returns_only_videos() {
        let (base, handle) = start_mock_catalog().await;
        let catalog = client(&base, TEST_KEY);

        let hits = catalog.search_videos("lofi chill beats", 30).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2", "v3"]);

        handle.abort();
    }

    #[tokio::test]
    async fn test_search_clamps_max_results() {
        let (base, handle) = start_mock_catalog().await;
        let catalog = client(&base, TEST_KEY);

        // maxResults=1 lets the mock return v1 and the channel item
        let hits = catalog.search_videos("q", 0).await.unwrap();
        assert_eq!(hits.len(), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_details_maps_snippet_and_duration() {
        let (base, handle) = start_mock_catalog().await;
        let catalog = client(&base, TEST_KEY);

        let ids = vec!["v1".to_string(), "v2".to_string()];
        let details = catalog.video_details(&ids).await.unwrap();

        assert_eq!(details.len(), 2);
        let v1 = details.iter().find(|d| d.id == "v1").unwrap();
        assert_eq!(v1.title, "Song v1");
        assert_eq!(v1.channel_title, "Artist");
        assert_eq!(v1.thumbnail_url, "https://img/v1/high.jpg");
        assert_eq!(v1.duration_iso8601, "PT3M30S");

        let v2 = details.iter().find(|d| d.id == "v2").unwrap();
        assert_eq!(v2.thumbnail_url, "https://img/v2/default.jpg");

        handle.abort();
    }

    #[tokio::test]
    async fn test_details_empty_ids_skips_request() {
        let catalog = client("http://127.0.0.1:9", TEST_KEY);
        assert!(catalog.video_details(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let (base, handle) = start_mock_catalog().await;
        let catalog = client(&base, TEST_KEY);

        let err = catalog.search_videos("quota", 30).await.unwrap_err();
        match err {
            CatalogError::ApiError(status, message) => {
                assert_eq!(status, 403);
                assert_eq!(message, "quotaExceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_wrong_key_is_api_error() {
        let (base, handle) = start_mock_catalog().await;
        let catalog = client(&base, "wrong");

        let err = catalog.search_videos("q", 30).await.unwrap_err();
        assert!(matches!(err, CatalogError::ApiError(400, _)));

        handle.abort();
    }

    #[tokio::test]
    async fn test_network_error_hides_api_key() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let catalog = client(&base, "secret-key");
        let err = catalog.search_videos("q", 30).await.unwrap_err();
        assert!(matches!(err, CatalogError::NetworkError(_)));
        assert!(!err.to_string().contains("secret-key"));
    }

    #[tokio::test]
    async fn test_trait_impl_delegates() {
        let (base, handle) = start_mock_catalog().await;
        let catalog = client(&base, TEST_KEY);
        let catalog: &dyn pipeline::VideoCatalog = &catalog;

        let hits = catalog.search("q", 2).await.unwrap();
        let ids: Vec<VideoId> = hits.into_iter().map(|h| h.id).collect();
        let details = catalog.details(&ids).await.unwrap();
        assert_eq!(details.len(), ids.len());

        handle.abort();
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        assert!(matches!(
            YouTubeCatalog::new("  ", Duration::from_secs(1)),
            Err(CatalogError::MissingApiKey)
        ));
    }
}
