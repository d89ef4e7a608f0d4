/*!
 * # Transcript Gateway
 *
 * An HTTP gateway that retrieves caption tracks for one or more videos,
 * aggregates every language track per video, adds machine-translated
 * fallback tracks and renders each track into the requested formats.
 *
 * ## Features
 *
 * - Aggregate endpoint: many videos, many formats, per-video failure isolation
 * - Raw endpoint: one video, one language, one format as a download
 * - Output formats: raw, json, srt, vtt, txt
 * - Declarative translation fallback policy
 * - Per-address rate limiting with loopback/private bypass
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `transcript`: Track, cue and translation policy types
 * - `providers`: Transcript provider interface and implementations:
 *   - `providers::youtube`: YouTube watch page client
 *   - `providers::mock`: In-memory provider for tests
 * - `rate_limiter`: Per-address admission gate
 * - `request_parser`: Query parameter normalisation
 * - `formatter`: Cue rendering
 * - `aggregator`: Per-video orchestration and translation fallback
 * - `response`: Response assembly and status selection
 * - `server`: axum router and serve loop
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod aggregator;
pub mod app_config;
pub mod errors;
pub mod formatter;
pub mod language_utils;
pub mod providers;
pub mod rate_limiter;
pub mod request_parser;
pub mod response;
pub mod server;
pub mod transcript;

// Re-export main types for easier usage
pub use aggregator::{AggregateResult, Aggregator};
pub use app_config::Config;
pub use errors::{GatewayError, ProviderError};
pub use formatter::{OutputFormat, Rendered};
pub use providers::TranscriptProvider;
pub use rate_limiter::RateLimiter;
pub use transcript::{Cue, TranscriptTrack, TranslationTarget};
