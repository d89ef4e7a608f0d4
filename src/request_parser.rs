/*!
 * Query parameter normalisation.
 *
 * Turns the raw query map into either an aggregate request (many videos,
 * many formats) or a raw-mode request (one video, one language, one format).
 */

use std::collections::HashMap;

use crate::errors::GatewayError;
use crate::formatter::OutputFormat;

/// Language used by raw mode when `lang` is absent
pub const DEFAULT_RAW_LANGUAGE: &str = "en";

/// Aggregate request over one or more videos
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRequest {
    pub video_ids: Vec<String>,
    pub formats: Vec<OutputFormat>,
}

/// Single-track shortcut request
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    pub video_id: String,
    pub language_code: String,
    pub format: OutputFormat,
}

/// A parsed request
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptRequest {
    Aggregate(AggregateRequest),
    Raw(RawRequest),
}

/// Parse query parameters into a request.
///
/// Raw mode is selected when `raw` is present together with exactly one
/// video id and exactly one format; its format errors are `Format`.
/// Everything else is `Validation`.
pub fn parse_request(
    params: &HashMap<String, String>,
    max_video_ids: usize,
) -> Result<TranscriptRequest, GatewayError> {
    let video_ids = multi_value(params, "videoIds", "videoId");
    let format_names = multi_value(params, "formats", "format");

    if params.contains_key("raw") && video_ids.len() == 1 && format_names.len() == 1 {
        let format = format_names[0].parse::<OutputFormat>()?;
        let language_code = params
            .get("lang")
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_RAW_LANGUAGE)
            .to_string();

        return Ok(TranscriptRequest::Raw(RawRequest {
            video_id: video_ids[0].clone(),
            language_code,
            format,
        }));
    }

    if video_ids.is_empty() {
        return Err(GatewayError::Validation("No video IDs provided".to_string()));
    }
    if video_ids.len() > max_video_ids {
        return Err(GatewayError::Validation("Too many video IDs provided".to_string()));
    }

    let formats = if format_names.is_empty() {
        OutputFormat::ALL.to_vec()
    } else {
        let mut formats = Vec::with_capacity(format_names.len());
        for name in &format_names {
            let format = name
                .parse::<OutputFormat>()
                .map_err(|e| GatewayError::Validation(e.to_string()))?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        formats
    };

    Ok(TranscriptRequest::Aggregate(AggregateRequest { video_ids, formats }))
}

/// Read a comma separated list from `plural`, falling back to `singular`.
/// Blank segments and repeats are dropped, first occurrence wins.
fn multi_value(params: &HashMap<String, String>, plural: &str, singular: &str) -> Vec<String> {
    let raw = match params.get(plural).filter(|v| !v.trim().is_empty()) {
        Some(value) => value,
        None => match params.get(singular) {
            Some(value) => value,
            None => return Vec::new(),
        },
    };

    let mut values: Vec<String> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !values.iter().any(|v| v == part) {
            values.push(part.to_string());
        }
    }
    values
}
