// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use transcript_gateway::app_config::{Config, LogLevel};
use transcript_gateway::providers::youtube::YouTubeProvider;
use transcript_gateway::server::{self, AppState};
use transcript_gateway::Aggregator;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway (default command)
    Serve(ServeArgs),

    /// Generate shell completions for transcript-gateway
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct ServeArgs {
    /// JSON configuration file
    #[arg(short, long = "config", env = "CONFIG_PATH")]
    config_path: Option<PathBuf>,

    /// Interface to bind
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Request budget per minute and client address
    #[arg(long, env = "RATE_LIMIT")]
    rate_limit: Option<u32>,

    /// Maximum video ids per aggregate request
    #[arg(long, env = "MAX_VIDEO_IDS")]
    max_video_ids: Option<usize>,

    /// Timeout for each provider call in seconds
    #[arg(long, env = "PROVIDER_TIMEOUT")]
    provider_timeout: Option<u64>,

    /// Set logging level
    #[arg(short, long, value_enum, env = "LOG_LEVEL")]
    log_level: Option<CliLogLevel>,
}

/// Transcript Gateway
///
/// Serves caption tracks for videos over HTTP, with translated fallbacks
/// and srt/vtt/txt/json rendering.
#[derive(Parser, Debug)]
#[command(name = "transcript-gateway")]
#[command(version)]
#[command(about = "HTTP gateway for video caption tracks")]
#[command(long_about = "Serves caption tracks for one or more videos over a single GET endpoint.

EXAMPLES:
    transcript-gateway                               # Listen on 0.0.0.0:5000
    transcript-gateway -p 8080 --rate-limit 30       # Custom port and budget
    transcript-gateway -c gateway.json               # Load settings from a file
    transcript-gateway completions bash > tg.bash    # Generate bash completions

QUERIES:
    /?videoIds=A,B&formats=srt,vtt                   # Aggregate
    /?videoId=A&lang=en&format=srt&raw               # Single file download")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    serve: ServeArgs,
}

// @struct: Coloured stderr logger
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, tag) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", colour, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "transcript-gateway", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Serve(args)) => run_serve(args).await,
        None => run_serve(cli.serve).await,
    }
}

/// Merge file, environment and flags into one validated config
fn load_config(options: &ServeArgs) -> Result<Config> {
    let mut config = match &options.config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(host) = &options.host {
        config.server.host = host.clone();
    }
    if let Some(port) = options.port {
        config.server.port = port;
    }
    if let Some(rate) = options.rate_limit {
        config.rate_limit.requests_per_minute = rate;
    }
    if let Some(max) = options.max_video_ids {
        config.max_video_ids = max;
    }
    if let Some(timeout) = options.provider_timeout {
        config.provider.timeout_secs = timeout;
    }
    if let Some(level) = &options.log_level {
        config.log_level = level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_serve(options: ServeArgs) -> Result<()> {
    let config = load_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let timeout = Duration::from_secs(config.provider.timeout_secs);
    let provider = YouTubeProvider::new(timeout, config.provider.accept_language.clone())
        .context("Failed to create transcript provider")?;
    let aggregator = Aggregator::new(Arc::new(provider), config.translations.clone(), timeout)
        .with_concurrency(config.provider.concurrent_requests);

    info!(
        "Rate limit {} req/min, at most {} video ids per request, {} translation target(s)",
        config.rate_limit.requests_per_minute,
        config.max_video_ids,
        config.translations.len()
    );

    server::serve(Arc::new(AppState::new(config, aggregator))).await
}
