//! Recommendation Engine
//!
//! Turns a search phrase into an ordered list of playable tracks.
//!
//! ## Algorithm
//! 1. Search the catalog for up to `limit` videos matching the phrase
//! 2. Deduplicate the returned identifiers (first occurrence wins)
//! 3. Fetch metadata for all identifiers in one batched details call
//! 4. Parse every duration; one malformed duration fails the whole call
//! 5. Re-associate details to search hits by identifier and emit tracks in
//!    search (relevance) order
//!
//! Catalog failures and timeouts abort the call; there is no retry and no
//! partial list.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use model::{parse_duration, PipelineError, Result, Track, VideoDetail, VideoId, VideoSummary};
use tracing::{debug, info, instrument};

use crate::traits::VideoCatalog;

/// Default number of tracks requested per recommendation
pub const DEFAULT_LIMIT: usize = 30;

/// Default upper bound for each catalog call
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(15);

/// Prefix of the playable URL built for every track
pub const DEFAULT_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

#[derive(Clone)]
pub struct RecommendationEngine {
    catalog: Arc<dyn VideoCatalog>,
    timeout: Duration,
    watch_url: String,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<dyn VideoCatalog>) -> Self {
        Self {
            catalog,
            timeout: DEFAULT_CATALOG_TIMEOUT,
            watch_url: DEFAULT_WATCH_URL.to_string(),
        }
    }

    /// Configure the per-call timeout (default: 15s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the playable URL prefix
    pub fn with_watch_url(mut self, watch_url: impl Into<String>) -> Self {
        self.watch_url = watch_url.into();
        self
    }

    /// Recommend up to `limit` tracks for `query`.
    #[instrument(skip(self), fields(catalog = self.catalog.name()))]
    pub async fn recommend(&self, query: &str, limit: usize) -> Result<Vec<Track>> {
        let start_time = Instant::now();
        if limit == 0 {
            return Ok(Vec::new());
        }

        let hits = self
            .call_catalog("search", self.catalog.search(query, limit))
            .await?;
        let ids = collect_ids(hits, limit);
        if ids.is_empty() {
            info!("Catalog returned no videos for '{}'", query);
            return Ok(Vec::new());
        }
        debug!("Search returned {} unique videos", ids.len());

        let details = self
            .call_catalog("details", self.catalog.details(&ids))
            .await?;
        let tracks = self.assemble_tracks(&ids, details)?;

        info!(
            "Recommended {} tracks for '{}' in {:.2?}",
            tracks.len(),
            query,
            start_time.elapsed()
        );
        Ok(tracks)
    }

    /// Run one catalog call under the configured timeout.
    async fn call_catalog<T>(
        &self,
        stage: &str,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(PipelineError::CatalogUnavailable(format!(
                "{} call failed: {:#}",
                stage, e
            ))),
            Err(_) => Err(PipelineError::CatalogUnavailable(format!(
                "{} call timed out after {:?}",
                stage, self.timeout
            ))),
        }
    }

    /// Match detail records back to the search hits by identifier.
    fn assemble_tracks(&self, ids: &[VideoId], details: Vec<VideoDetail>) -> Result<Vec<Track>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut by_id: HashMap<VideoId, Track> = HashMap::with_capacity(details.len());

        for detail in details {
            if !wanted.contains(detail.id.as_str()) {
                debug!("Dropping detail record {} not present in search results", detail.id);
                continue;
            }
            let duration_seconds = parse_duration(&detail.duration_iso8601)?;
            if !by_id.contains_key(&detail.id) {
                let track = self.build_track(detail, duration_seconds);
                by_id.insert(track.id.clone(), track);
            }
        }

        let tracks: Vec<Track> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
        if tracks.len() < ids.len() {
            debug!(
                "{} search hits had no detail record",
                ids.len() - tracks.len()
            );
        }
        Ok(tracks)
    }

    fn build_track(&self, detail: VideoDetail, duration_seconds: f64) -> Track {
        let url = format!("{}{}", self.watch_url, detail.id);
        Track {
            id: detail.id,
            title: detail.title,
            artist: detail.channel_title,
            album: None,
            cover_image_url: detail.thumbnail_url,
            genres: Vec::new(),
            duration_seconds,
            url,
        }
    }
}

/// Deduplicate search hits preserving rank, capped at `limit`.
fn collect_ids(hits: Vec<VideoSummary>, limit: usize) -> Vec<VideoId> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .map(|hit| hit.id)
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .take(limit)
        .collect()
}
