/*!
 * Error types for the transcript gateway.
 *
 * This module contains custom error types for the provider boundary and
 * the request pipeline, using the thiserror crate for ergonomic error definitions.
 */

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to a transcript provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The video or the requested language track does not exist
    #[error("No transcript found: {0}")]
    NotFound(String),

    /// The uploader disabled captions for the video
    #[error("Transcripts are disabled: {0}")]
    Disabled(String),

    /// The provider refused to serve the request (captcha, IP ban)
    #[error("Request blocked by provider: {0}")]
    Blocked(String),

    /// Translation was requested for a track that cannot be translated
    #[error("Transcript is not translatable: {0}")]
    NotTranslatable(String),

    /// Transport failures, timeouts and anything else
    #[error("Provider error: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Returns true when the error means "no such track"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

/// Errors raised by the request pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Malformed, missing or excess input
    #[error("{0}")]
    Validation(String),

    /// The caller exceeded its request budget
    #[error("Rate limit exceeded. Try again later.")]
    RateLimitExceeded,

    /// Unrecognised output format in raw mode
    #[error("Unsupported format: {0}")]
    Format(String),

    /// Error from the transcript provider
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl GatewayError {
    /// HTTP status used when this error ends a request on its own
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Format(_) => StatusCode::BAD_REQUEST,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
