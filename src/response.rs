/*!
 * Response assembly.
 *
 * Status selection: the aggregate endpoint answers 200 once processing has
 * begun, whatever was recorded in `errors`. 429 is reserved for rate limit
 * rejections and 400 for raw-mode format errors.
 */

use axum::Json;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::aggregator::AggregateResult;
use crate::errors::GatewayError;
use crate::formatter::{OutputFormat, render};
use crate::request_parser::RawRequest;
use crate::transcript::Cue;

/// Header carrying the attachment filename for browser clients
pub static FILENAME_HEADER: HeaderName = HeaderName::from_static("x-filename");

/// `{"results": .., "errors": [[id, message], ..]}` with status 200
pub fn aggregate_response(result: AggregateResult) -> Response {
    (StatusCode::OK, Json(result)).into_response()
}

/// Fixed rejection payload with status 429
pub fn rate_limited_response() -> Response {
    let body = json!({
        "results": {},
        "errors": [GatewayError::RateLimitExceeded.to_string()],
    });
    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
}

/// Fail-fast error for raw mode
pub fn error_response(error: &GatewayError) -> Response {
    let body = json!({ "error": error.to_string() });
    (error.status_code(), Json(body)).into_response()
}

/// Raw mode success: inline cues for `raw`, a download for every other format
pub fn raw_response(request: &RawRequest, cues: &[Cue]) -> Response {
    if request.format == OutputFormat::Raw {
        return (StatusCode::OK, Json(cues)).into_response();
    }

    let filename = attachment_filename(&request.video_id, &request.language_code, request.format);
    let body = render(cues, request.format).into_text();

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(request.format.content_type()));
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&filename) {
        headers.insert(FILENAME_HEADER.clone(), value);
    }

    (StatusCode::OK, headers, body).into_response()
}

/// `"{video_id} - {language_code}.{format}"`, made safe for a quoted header value
pub fn attachment_filename(video_id: &str, language_code: &str, format: OutputFormat) -> String {
    format!("{} - {}.{}", video_id, language_code, format.name())
        .chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}
