use serde::{Deserialize, Serialize};
use std::fmt;

// @module: Caption track and cue model

// @const: Key suffix for machine generated tracks
pub const GENERATED_SUFFIX: &str = "_generated";

// @const: Key suffix for a forced translation named like a native track
pub const TRANSLATED_SUFFIX: &str = "_translated";

// @struct: Single timed caption entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    // @field: Caption text, may span several lines
    pub text: String,

    // @field: Start offset in seconds
    pub start: f64,

    // @field: Duration in seconds
    pub duration: f64,
}

impl Cue {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Cue {
            text: text.into(),
            start,
            duration,
        }
    }

    /// End offset in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Start offset rounded to whole milliseconds
    pub fn start_ms(&self) -> u64 {
        seconds_to_ms(self.start)
    }

    /// End offset rounded to whole milliseconds
    pub fn end_ms(&self) -> u64 {
        seconds_to_ms(self.end())
    }
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// A language a track can be machine translated into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationLanguage {
    /// Human readable name, e.g. "German"
    pub language: String,
    /// Provider language code, e.g. "de"
    pub language_code: String,
}

/// Metadata for one caption stream of one video. Content is fetched
/// separately through the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptTrack {
    /// Video the track belongs to
    pub video_id: String,
    /// Display name of the language
    pub language: String,
    /// Provider language code
    pub language_code: String,
    /// True for automatic speech recognition tracks
    pub is_generated: bool,
    /// True when the provider can translate this track
    pub is_translatable: bool,
    /// Languages this track can be translated into
    pub translation_languages: Vec<TranslationLanguage>,
    /// Opaque locator used by the provider to fetch content
    pub url: String,
}

impl TranscriptTrack {
    /// Key under which the track appears in an aggregate result
    pub fn track_key(&self) -> String {
        track_key(&self.language_code, self.is_generated)
    }

    /// Whether `code` is one of the advertised translation targets
    pub fn can_translate_to(&self, code: &str) -> bool {
        self.translation_languages
            .iter()
            .any(|l| l.language_code == code)
    }
}

impl fmt::Display for TranscriptTrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.language_code, self.language)?;
        if self.is_generated {
            write!(f, " [generated]")?;
        }
        Ok(())
    }
}

/// Builds a track key from a language code and the generated flag
pub fn track_key(language_code: &str, is_generated: bool) -> String {
    if is_generated {
        format!("{}{}", language_code, GENERATED_SUFFIX)
    } else {
        language_code.to_string()
    }
}

/// One entry of the translation fallback policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationTarget {
    /// Compared against existing track keys
    pub display_name: String,
    /// Language code to translate into
    pub target_code: String,
    /// Translate even if a matching track already exists
    #[serde(default)]
    pub force: bool,
}

impl TranslationTarget {
    pub fn new(display_name: impl Into<String>, target_code: impl Into<String>, force: bool) -> Self {
        Self {
            display_name: display_name.into(),
            target_code: target_code.into(),
            force,
        }
    }
}
