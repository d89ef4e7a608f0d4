use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::TranscriptProvider;
use crate::transcript::{Cue, TranscriptTrack, TranslationLanguage};

const WATCH_URL: &str = "https://www.youtube.com/watch";

// @const: One <text> element of a timed-text document
static TEXT_ELEMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<text start="([^"]*)"(?: dur="([^"]*)")?[^>]*>(.*?)</text>"#).unwrap()
});

// @const: Inline markup inside caption text
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// YouTube client reading caption tracks from watch pages
#[derive(Debug, Clone)]
pub struct YouTubeProvider {
    /// HTTP client for making requests
    client: Client,
    /// Value of the Accept-Language header
    accept_language: String,
}

/// The `captions` object embedded in a watch page
#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    renderer: Option<CaptionsRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionsRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
    #[serde(default)]
    translation_languages: Vec<CaptionLanguage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    name: Label,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    is_translatable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionLanguage {
    language_code: String,
    language_name: Label,
}

/// Either `{"simpleText": ..}` or `{"runs": [{"text": ..}]}`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Label {
    #[serde(default)]
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<Run>,
}

#[derive(Debug, Deserialize)]
struct Run {
    text: String,
}

impl Label {
    fn text(&self) -> String {
        match &self.simple_text {
            Some(text) => text.clone(),
            None => self.runs.iter().map(|r| r.text.as_str()).collect(),
        }
    }
}

impl YouTubeProvider {
    /// Create a client with the given request timeout and Accept-Language
    pub fn new(timeout: Duration, accept_language: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            accept_language: accept_language.into(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT_LANGUAGE, &self.accept_language)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Blocked("YouTube is rate limiting this server".to_string()));
        }
        if !status.is_success() {
            return Err(ProviderError::Unknown(format!("YouTube responded with {}", status)));
        }

        Ok(response.text().await?)
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String, ProviderError> {
        let url = Url::parse_with_params(WATCH_URL, &[("v", video_id)])
            .map_err(|e| ProviderError::Unknown(e.to_string()))?;
        debug!("Fetching watch page for {}", video_id);
        self.get_text(url.as_str()).await
    }
}

/// Extract the caption tracks from watch page HTML
fn parse_watch_page(video_id: &str, html: &str) -> Result<Vec<TranscriptTrack>, ProviderError> {
    let Some((_, after)) = html.split_once("\"captions\":") else {
        if html.contains("class=\"g-recaptcha\"") {
            return Err(ProviderError::Blocked(format!("captcha required for video {}", video_id)));
        }
        if html.contains("\"playabilityStatus\":{\"status\":\"ERROR\"")
            || html.contains("\"playabilityStatus\":{\"status\":\"LOGIN_REQUIRED\"")
        {
            return Err(ProviderError::NotFound(format!("video {} is unavailable", video_id)));
        }
        return Err(ProviderError::Disabled(format!("video {} has no captions", video_id)));
    };

    let json = after.split(",\"videoDetails").next().unwrap_or(after);
    let captions: Captions = serde_json::from_str(json.trim())
        .map_err(|e| ProviderError::Unknown(format!("could not parse caption list: {}", e)))?;

    let renderer = captions
        .renderer
        .ok_or_else(|| ProviderError::Disabled(format!("video {} has no captions", video_id)))?;

    let translation_languages: Vec<TranslationLanguage> = renderer
        .translation_languages
        .iter()
        .map(|l| TranslationLanguage {
            language: l.language_name.text(),
            language_code: l.language_code.clone(),
        })
        .collect();

    Ok(renderer
        .caption_tracks
        .into_iter()
        .map(|t| TranscriptTrack {
            video_id: video_id.to_string(),
            language: t.name.text(),
            language_code: t.language_code,
            is_generated: t.kind.as_deref() == Some("asr"),
            is_translatable: t.is_translatable,
            translation_languages: if t.is_translatable {
                translation_languages.clone()
            } else {
                Vec::new()
            },
            url: t.base_url.replace("&fmt=srv3", ""),
        })
        .collect())
}

/// Parse a timed-text XML document into cues. Elements with empty text are dropped.
fn parse_timed_text(xml: &str) -> Vec<Cue> {
    TEXT_ELEMENT_REGEX
        .captures_iter(xml)
        .filter_map(|caps| {
            let start = caps.get(1)?.as_str().parse::<f64>().ok()?;
            let duration = caps
                .get(2)
                .and_then(|d| d.as_str().parse::<f64>().ok())
                .unwrap_or(0.0);
            let text = unescape(&unescape(&caps[3]));
            let text = TAG_REGEX.replace_all(&text, "").trim().to_string();
            if text.is_empty() {
                None
            } else {
                Some(Cue::new(text, start, duration))
            }
        })
        .collect()
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[async_trait]
impl TranscriptProvider for YouTubeProvider {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TranscriptTrack>, ProviderError> {
        let html = self.fetch_watch_page(video_id).await?;
        parse_watch_page(video_id, &html)
    }

    async fn fetch_content(&self, track: &TranscriptTrack) -> Result<Vec<Cue>, ProviderError> {
        let xml = self.get_text(&track.url).await?;
        let cues = parse_timed_text(&xml);
        if cues.is_empty() && !xml.trim().is_empty() && !xml.contains("<transcript") && !xml.contains("<timedtext") {
            warn!("Unexpected timed-text payload for {}", track);
            return Err(ProviderError::Unknown(format!("unreadable caption data for {}", track)));
        }
        Ok(cues)
    }

    async fn translate(&self, track: &TranscriptTrack, target_code: &str) -> Result<TranscriptTrack, ProviderError> {
        if !track.is_translatable {
            return Err(ProviderError::NotTranslatable(track.to_string()));
        }
        let language = track
            .translation_languages
            .iter()
            .find(|l| l.language_code == target_code)
            .ok_or_else(|| {
                ProviderError::NotTranslatable(format!("{} cannot be translated to {}", track, target_code))
            })?;

        Ok(TranscriptTrack {
            video_id: track.video_id.clone(),
            language: language.language.clone(),
            language_code: target_code.to_string(),
            is_generated: track.is_generated,
            is_translatable: false,
            translation_languages: Vec::new(),
            url: format!("{}&tlang={}", track.url, target_code),
        })
    }

    async fn get_direct(&self, video_id: &str, language_code: &str) -> Result<Vec<Cue>, ProviderError> {
        let tracks = self.list_tracks(video_id).await?;
        // Manually created tracks win over generated ones
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
