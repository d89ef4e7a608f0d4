/*!
 * Mock provider implementation for testing.
 *
 * Videos, failures and latency are scripted up front:
 * - `with_video` registers tracks and their cues
 * - `with_failure` makes every call for a video fail
 * - `with_content_failure` lets listing succeed but content fetches fail
 * - `with_delay` simulates a slow provider (for timeout and concurrency testing)
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::TranscriptProvider;
use crate::transcript::{Cue, TranscriptTrack, TranslationLanguage};

const TRANSLATION_PARAM: &str = "&tlang=";

/// Mock provider for testing aggregation behavior
#[derive(Debug, Default)]
pub struct MockProvider {
    /// Registered tracks per video, in listing order
    videos: HashMap<String, Vec<(TranscriptTrack, Vec<Cue>)>>,
    /// Videos whose every call fails
    failures: HashMap<String, ProviderError>,
    /// Videos whose content fetches fail
    content_failures: HashSet<String>,
    /// Artificial latency per call
    delay: Option<Duration>,
    /// Total number of calls served
    request_count: Arc<AtomicUsize>,
    /// Calls currently in progress
    in_flight: Arc<AtomicUsize>,
    /// Highest value `in_flight` has reached
    max_in_flight: Arc<AtomicUsize>,
    /// (source track key, target code) for every translation performed
    translations: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockProvider {
    /// Create an empty mock provider; unknown videos are `NotFound`
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a video with its tracks and their cues
    pub fn with_video(mut self, video_id: &str, tracks: Vec<(TranscriptTrack, Vec<Cue>)>) -> Self {
        self.videos.insert(video_id.to_string(), tracks);
        self
    }

    /// Make every call for `video_id` fail with `error`
    pub fn with_failure(mut self, video_id: &str, error: ProviderError) -> Self {
        self.failures.insert(video_id.to_string(), error);
        self
    }

    /// Make content fetches for `video_id` fail
    pub fn with_content_failure(mut self, video_id: &str) -> Self {
        self.content_failures.insert(video_id.to_string());
        self
    }

    /// Delay every call by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Build a track with translation targets `de`, `fr` and `en`
    pub fn track(video_id: &str, language_code: &str, is_generated: bool, is_translatable: bool) -> TranscriptTrack {
        let translation_languages = if is_translatable {
            ["de", "fr", "en"]
                .iter()
                .map(|code| TranslationLanguage {
                    language: language_name(code),
                    language_code: code.to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };

        TranscriptTrack {
            video_id: video_id.to_string(),
            language: language_name(language_code),
            language_code: language_code.to_string(),
            is_generated,
            is_translatable,
            translation_languages,
            url: format!("mock://{}/{}{}", video_id, language_code, if is_generated { "/asr" } else { "" }),
        }
    }

    /// Two cues tagged with the language code
    pub fn cues(language_code: &str) -> Vec<Cue> {
        vec![
            Cue::new(format!("[{}] first line", language_code), 0.0, 1.5),
            Cue::new(format!("[{}] second line", language_code), 1.5, 2.25),
        ]
    }

    /// Number of provider calls made so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were in progress at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Translations performed so far
    pub fn translations(&self) -> Vec<(String, String)> {
        self.translations.lock().clone()
    }

    async fn begin(&self, video_id: &str) -> Result<(), ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.failures.get(video_id) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn tracks_for(&self, video_id: &str) -> Result<&Vec<(TranscriptTrack, Vec<Cue>)>, ProviderError> {
        self.videos
            .get(video_id)
            .ok_or_else(|| ProviderError::NotFound(format!("video {} is unavailable", video_id)))
    }
}

fn language_name(code: &str) -> String {
    language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string())
}

#[async_trait]
impl TranscriptProvider for MockProvider {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TranscriptTrack>, ProviderError> {
        self.begin(video_id).await?;
        let tracks = self.tracks_for(video_id)?;
        Ok(tracks.iter().map(|(track, _)| track.clone()).collect())
    }

    async fn fetch_content(&self, track: &TranscriptTrack) -> Result<Vec<Cue>, ProviderError> {
        self.begin(&track.video_id).await?;
        if self.content_failures.contains(&track.video_id) {
            return Err(ProviderError::Unknown(format!("content for {} could not be fetched", track)));
        }

        let (base_url, target) = match track.url.split_once(TRANSLATION_PARAM) {
            Some((base, target)) => (base, Some(target)),
            None => (track.url.as_str(), None),
        };

        let (_, cues) = self
            .tracks_for(&track.video_id)?
            .iter()
            .find(|(t, _)| t.url == base_url)
            .ok_or_else(|| ProviderError::NotFound(format!("no content at {}", track.url)))?;

        Ok(match target {
            Some(code) => cues
                .iter()
                .map(|c| Cue::new(format!("[{}] {}", code, c.text), c.start, c.duration))
                .collect(),
            None => cues.clone(),
        })
    }

    async fn translate(&self, track: &TranscriptTrack, target_code: &str) -> Result<TranscriptTrack, ProviderError> {
        self.begin(&track.video_id).await?;
        if !track.is_translatable {
            return Err(ProviderError::NotTranslatable(track.to_string()));
        }

        self.translations
            .lock()
            .push((track.track_key(), target_code.to_string()));

        Ok(TranscriptTrack {
            video_id: track.video_id.clone(),
            language: language_name(target_code),
            language_code: target_code.to_string(),
            is_generated: track.is_generated,
            is_translatable: false,
            translation_languages: Vec::new(),
            url: format!("{}{}{}", track.url, TRANSLATION_PARAM, target_code),
        })
    }

    async fn get_direct(&self, video_id: &str, language_code: &str) -> Result<Vec<Cue>, ProviderError> {
        let tracks = self.list_tracks(video_id).await?;
        let track = tracks
            .iter()
            .filter(|t| t.language_code == language_code)
            .min_by_key(|t| t.is_generated)
            .ok_or_else(|| {
                ProviderError::NotFound(format!("no {} transcript for video {}", language_code, video_id))
            })?;
        self.fetch_content(track).await
    }
}
