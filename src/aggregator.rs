/*!
 * Per-video aggregation of caption tracks.
 *
 * For every requested video the aggregator lists the native tracks, renders
 * each into the requested formats, then applies the translation fallback
 * policy. A provider failure discards that video's partial result and is
 * recorded as an error; other videos are unaffected. At most
 * `max_concurrent_videos` videos are in flight at once and outcomes are
 * merged in request order.
 *
 * Translated tracks are keyed by the policy entry's display name. A forced
 * entry whose display name is held by a native track is stored under
 * `{display_name}_translated`, so native tracks are never replaced.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{GatewayError, ProviderError};
use crate::formatter::{OutputFormat, Rendered, render};
use crate::providers::TranscriptProvider;
use crate::request_parser::{AggregateRequest, RawRequest};
use crate::transcript::{Cue, TRANSLATED_SUFFIX, TranscriptTrack, TranslationTarget};

/// Identifier used for errors that do not belong to a video
pub const GLOBAL_ERROR_KEY: &str = "global";

/// Videos processed at once when no limit is configured
pub const DEFAULT_MAX_CONCURRENT_VIDEOS: usize = 4;

/// Rendered track as it appears in the aggregate response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPayload {
    pub language_code: String,
    pub is_generated: bool,
    pub is_translatable: bool,
    pub url: String,
    /// Format name to rendered value
    pub content: BTreeMap<String, Rendered>,
}

/// Track key to rendered track, for one video
pub type TrackMap = BTreeMap<String, TrackPayload>;

/// Accumulated results and errors of one aggregate request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    pub results: BTreeMap<String, TrackMap>,
    pub errors: Vec<(String, String)>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a single video
    pub fn record_error(&mut self, video_id: &str, message: impl Into<String>) {
        self.errors.push((video_id.to_string(), message.into()));
    }

    /// Record an error that applies to the whole request
    pub fn record_global_error(&mut self, error: &GatewayError) {
        self.errors.push((GLOBAL_ERROR_KEY.to_string(), error.to_string()));
    }
}

/// Orchestrates provider calls and rendering
#[derive(Debug, Clone)]
pub struct Aggregator {
    /// Source of track listings, content and translations
    provider: Arc<dyn TranscriptProvider>,

    /// Translation fallback policy, applied in order
    policy: Vec<TranslationTarget>,

    /// Upper bound for every single provider call
    call_timeout: Duration,

    /// Upper bound for videos processed at once
    max_concurrent_videos: usize,
}

impl Aggregator {
    pub fn new(provider: Arc<dyn TranscriptProvider>, policy: Vec<TranslationTarget>, call_timeout: Duration) -> Self {
        Self {
            provider,
            policy,
            call_timeout,
            max_concurrent_videos: DEFAULT_MAX_CONCURRENT_VIDEOS,
        }
    }

    /// Limit how many videos of one request are processed at once (at least 1)
    pub fn with_concurrency(mut self, max_concurrent_videos: usize) -> Self {
        self.max_concurrent_videos = max_concurrent_videos.max(1);
        self
    }

    /// The active translation policy
    pub fn policy(&self) -> &[TranslationTarget] {
        &self.policy
    }

    /// Process every video of `request` into `result`
    pub async fn aggregate(&self, request: &AggregateRequest, result: &mut AggregateResult) {
        let pending: Vec<_> = request
            .video_ids
            .iter()
            .map(|video_id| self.add_video(video_id, &request.formats))
            .collect();
        let outcomes: Vec<_> = stream::iter(pending)
            .buffered(self.max_concurrent_videos)
            .collect()
            .await;

        for (video_id, outcome) in request.video_ids.iter().zip(outcomes) {
            match outcome {
                Ok(tracks) => {
                    result.results.insert(video_id.clone(), tracks);
                }
                Err(error) => {
                    warn!("Skipping video {}: {}", video_id, error);
                    result.record_error(video_id, error.to_string());
                }
            }
        }
    }

    /// Build the track map of one video. Any provider error fails the whole video.
    pub async fn add_video(&self, video_id: &str, formats: &[OutputFormat]) -> Result<TrackMap, ProviderError> {
        let tracks = self.call(self.provider.list_tracks(video_id)).await?;
        debug!("Video {} has {} native track(s)", video_id, tracks.len());

        let mut track_map = TrackMap::new();
        for track in &tracks {
            let payload = self.render_track(track, formats).await?;
            track_map.insert(track.track_key(), payload);
        }
        let native_keys: HashSet<String> = track_map.keys().cloned().collect();

        for target in &self.policy {
            if !target.force && track_map.contains_key(&target.display_name) {
                continue;
            }
            // Translations always come from the first listed track
            let Some(source) = tracks.first() else {
                continue;
            };
            if !source.is_translatable {
                debug!("First track of {} is not translatable, skipping {}", video_id, target.target_code);
                continue;
            }

            let translated = self.call(self.provider.translate(source, &target.target_code)).await?;
            let payload = self.render_track(&translated, formats).await?;
            let key = if native_keys.contains(&target.display_name) {
                format!("{}{}", target.display_name, TRANSLATED_SUFFIX)
            } else {
                target.display_name.clone()
            };
            track_map.insert(key, payload);
        }

        Ok(track_map)
    }

    /// Raw mode: exact-language lookup, falling back to translating the
    /// first native track
    pub async fn fetch_single(&self, request: &RawRequest) -> Result<Vec<Cue>, ProviderError> {
        let direct = self
            .call(self.provider.get_direct(&request.video_id, &request.language_code))
            .await;

        match direct {
            Err(error) if error.is_not_found() => {
                debug!(
                    "No {} track for {}, translating the first listed track",
                    request.language_code, request.video_id
                );
                let tracks = self.call(self.provider.list_tracks(&request.video_id)).await?;
                let source = tracks.first().ok_or_else(|| {
                    ProviderError::NotFound(format!("video {} has no transcripts", request.video_id))
                })?;
                let translated = self
                    .call(self.provider.translate(source, &request.language_code))
                    .await?;
                self.call(self.provider.fetch_content(&translated)).await
            }
            other => other,
        }
    }

    async fn render_track(&self, track: &TranscriptTrack, formats: &[OutputFormat]) -> Result<TrackPayload, ProviderError> {
        let cues = self.call(self.provider.fetch_content(track)).await?;
        let content = formats
            .iter()
            .map(|format| (format.name().to_string(), render(&cues, *format)))
            .collect();

        Ok(TrackPayload {
            language_code: track.language_code.clone(),
            is_generated: track.is_generated,
            is_translatable: track.is_translatable,
            url: track.url.clone(),
            content,
        })
    }

    /// Run a provider call under the configured timeout
    async fn call<T, F>(&self, future: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.call_timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Unknown(format!(
                "provider call timed out after {}s",
                self.call_timeout.as_secs_f64()
            ))),
        }
    }
}
