/*!
 * Transcript provider implementations.
 *
 * This module contains the capability interface the gateway consumes and
 * its implementations:
 * - `youtube`: scrapes caption tracks from YouTube watch pages
 * - `mock`: in-memory provider for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::transcript::{Cue, TranscriptTrack};

/// Common trait for all transcript providers
///
/// Calls may block on network I/O. Callers impose their own timeouts.
#[async_trait]
pub trait TranscriptProvider: Send + Sync + Debug {
    /// List the native caption tracks of a video, without content
    ///
    /// # Arguments
    /// * `video_id` - Provider specific video identifier
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TranscriptTrack>, ProviderError>;

    /// Fetch the cues of a track
    async fn fetch_content(&self, track: &TranscriptTrack) -> Result<Vec<Cue>, ProviderError>;

    /// Derive a machine translated track
    ///
    /// Fails with `NotTranslatable` if `track.is_translatable` is false.
    async fn translate(&self, track: &TranscriptTrack, target_code: &str) -> Result<TranscriptTrack, ProviderError>;

    /// Fetch the cues of the track whose language code is exactly `language_code`
    ///
    /// Fails with `NotFound` if the video has no such track.
    async fn get_direct(&self, video_id: &str, language_code: &str) -> Result<Vec<Cue>, ProviderError>;
}

pub mod mock;
pub mod youtube;
