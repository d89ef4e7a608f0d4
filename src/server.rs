/*!
 * HTTP surface: a single `GET /` endpoint.
 *
 * request -> rate limit gate -> parser -> raw shortcut or aggregation -> response
 */

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{Method, header};
use axum::response::Response;
use axum::routing::get;
use log::{debug, info, warn};
use tower_http::cors::{Any, CorsLayer};

use crate::aggregator::{AggregateResult, Aggregator};
use crate::app_config::Config;
use crate::errors::GatewayError;
use crate::rate_limiter::RateLimiter;
use crate::request_parser::{TranscriptRequest, parse_request};
use crate::response::{self, FILENAME_HEADER};

/// Shared state of the running server
pub struct AppState {
    pub config: Config,
    pub limiter: RateLimiter,
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn new(config: Config, aggregator: Aggregator) -> Self {
        let limiter = RateLimiter::new(config.rate_limit.requests_per_minute);
        Self {
            config,
            limiter,
            aggregator,
        }
    }
}

/// Build the router with CORS applied
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .expose_headers([header::CONTENT_DISPOSITION, FILENAME_HEADER.clone()]);

    Router::new()
        .route("/", get(get_transcripts))
        .layer(cors)
        .with_state(state)
}

async fn get_transcripts(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let client = addr.ip().to_string();
    let now = chrono::Utc::now().timestamp();
    if !state.limiter.admit(&client, now) {
        info!("Rate limit exceeded for {}", client);
        return response::rate_limited_response();
    }
    debug!("Admitted request from {}", client);

    // The container exists before validation so global errors have a home
    let mut result = AggregateResult::new();

    match parse_request(&params, state.config.max_video_ids) {
        Ok(TranscriptRequest::Raw(raw)) => match state.aggregator.fetch_single(&raw).await {
            Ok(cues) => response::raw_response(&raw, &cues),
            Err(error) => {
                warn!("Raw request for {} ({}) failed: {}", raw.video_id, raw.language_code, error);
                response::error_response(&GatewayError::from(error))
            }
        },
        Ok(TranscriptRequest::Aggregate(request)) => {
            state.aggregator.aggregate(&request, &mut result).await;
            info!(
                "Served {} video(s) with {} error(s)",
                result.results.len(),
                result.errors.len()
            );
            response::aggregate_response(result)
        }
        Err(error @ GatewayError::Format(_)) => response::error_response(&error),
        Err(error) => {
            result.record_global_error(&error);
            response::aggregate_response(result)
        }
    }
}

/// Periodically drop rate limit entries that can no longer reject anyone
pub fn spawn_sweeper(limiter: RateLimiter, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            limiter.sweep(chrono::Utc::now().timestamp());
        }
    })
}

/// Bind and serve until Ctrl+C
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let ip: IpAddr = state
        .config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid listen address: {}", state.config.server.host))?;
    let addr = SocketAddr::new(ip, state.config.server.port);

    let sweeper = if state.config.rate_limit.sweep_interval_secs > 0 {
        Some(spawn_sweeper(
            state.limiter.clone(),
            Duration::from_secs(state.config.rate_limit.sweep_interval_secs),
        ))
    } else {
        None
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    let app = create_router(state);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }
    info!("Shutting down");
}
