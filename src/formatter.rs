/*!
 * Rendering of cue sequences into the supported output formats.
 *
 * Every format is a pure function of the cue slice, so repeated renders of
 * the same input are byte-identical. Formats are a closed enumeration that is
 * validated when the request is parsed; rendering itself cannot fail.
 */

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::GatewayError;
use crate::transcript::Cue;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    Raw,
    Json,
    Srt,
    Vtt,
    Txt,
}

/// A rendering function for one format
pub type Renderer = fn(&[Cue]) -> Rendered;

// Indexed by `OutputFormat as usize`
const RENDERERS: [(OutputFormat, Renderer); 5] = [
    (OutputFormat::Raw, render_raw),
    (OutputFormat::Json, render_json),
    (OutputFormat::Srt, render_srt),
    (OutputFormat::Vtt, render_vtt),
    (OutputFormat::Txt, render_txt),
];

impl OutputFormat {
    /// All formats, in the order they are rendered when none are requested
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Raw,
        OutputFormat::Json,
        OutputFormat::Srt,
        OutputFormat::Vtt,
        OutputFormat::Txt,
    ];

    /// Name used in query parameters, content maps and file extensions
    pub fn name(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Json => "json",
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Txt => "txt",
        }
    }

    /// MIME type for downloadable attachments
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Raw | Self::Json => "application/json",
            Self::Srt => "application/x-subrip; charset=utf-8",
            Self::Vtt => "text/vtt; charset=utf-8",
            Self::Txt => "text/plain; charset=utf-8",
        }
    }

    /// Renderer registered for this format
    pub fn renderer(self) -> Renderer {
        RENDERERS[self as usize].1
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == name)
            .ok_or_else(|| GatewayError::Format(s.trim().to_string()))
    }
}

impl Serialize for OutputFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Output of a renderer: either text or a structural cue list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rendered {
    Text(String),
    Cues(Vec<Cue>),
}

impl Rendered {
    /// Text body for file downloads. Structural payloads are encoded as JSON.
    pub fn into_text(self) -> String {
        match self {
            Rendered::Text(text) => text,
            Rendered::Cues(cues) => serde_json::to_string(&cues).unwrap_or_else(|_| "[]".to_string()),
        }
    }
}

/// Render `cues` into `format`
pub fn render(cues: &[Cue], format: OutputFormat) -> Rendered {
    (format.renderer())(cues)
}

fn render_raw(cues: &[Cue]) -> Rendered {
    Rendered::Cues(cues.to_vec())
}

fn render_json(cues: &[Cue]) -> Rendered {
    Rendered::Cues(
        cues.iter()
            .map(|c| Cue::new(c.text.clone(), c.start, c.duration))
            .collect(),
    )
}

fn render_srt(cues: &[Cue]) -> Rendered {
    if cues.is_empty() {
        return Rendered::Text(String::new());
    }
    let blocks: Vec<String> = cues
        .iter()
        .enumerate()
        .map(|(i, cue)| {
            format!(
                "{}\n{} --> {}\n{}",
                i + 1,
                format_timestamp(cue.start_ms(), ','),
                format_timestamp(cue.end_ms(), ','),
                cue.text
            )
        })
        .collect();
    Rendered::Text(format!("{}\n", blocks.join("\n\n")))
}

fn render_vtt(cues: &[Cue]) -> Rendered {
    if cues.is_empty() {
        return Rendered::Text("WEBVTT\n".to_string());
    }
    let blocks: Vec<String> = cues
        .iter()
        .map(|cue| {
            format!(
                "{} --> {}\n{}",
                format_timestamp(cue.start_ms(), '.'),
                format_timestamp(cue.end_ms(), '.'),
                cue.text
            )
        })
        .collect();
    Rendered::Text(format!("WEBVTT\n\n{}\n", blocks.join("\n\n")))
}

fn render_txt(cues: &[Cue]) -> Rendered {
    let lines: Vec<&str> = cues.iter().map(|c| c.text.as_str()).collect();
    Rendered::Text(lines.join("\n"))
}

/// Format milliseconds as `HH:MM:SS<sep>mmm`
pub fn format_timestamp(ms: u64, separator: char) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, seconds, separator, millis)
}
