//! Logging setup for native builds of the module crates.
//!
//! # Design
//! - One global subscriber per process; a second install is an error, not a no-op.
//! - `RUST_LOG` wins over the configured level when it parses.
//! - The build identifier is recorded once so every log line agrees on it.

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{TelemetryError, TelemetryResult};

/// Level used when neither `RUST_LOG` nor `AIERA_LOG_LEVEL` is set.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Environment variable selecting the default level.
pub const ENV_LOG_LEVEL: &str = "AIERA_LOG_LEVEL";
/// Environment variable selecting `json` or `pretty` output.
pub const ENV_LOG_FORMAT: &str = "AIERA_LOG_FORMAT";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Pretty in debug builds, JSON in release builds.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Parse `json` or `pretty`, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Settings for [`init_logging`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `aiera_bridge=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Build identifier recorded for the process.
    pub build_sha: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::infer(),
            build_sha: build_sha().to_string(),
        }
    }
}

impl LoggingConfig {
    /// Read `AIERA_LOG_LEVEL` and `AIERA_LOG_FORMAT` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup. Blank or unrecognised
    /// values fall back to the defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let level = lookup(ENV_LOG_LEVEL)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.level);
        let format = lookup(ENV_LOG_FORMAT)
            .as_deref()
            .and_then(LogFormat::parse)
            .unwrap_or(defaults.format);
        Self {
            level,
            format,
            build_sha: defaults.build_sha,
        }
    }
}

/// Install the global tracing subscriber described by `config`.
///
/// Native hosts call this once at process start, before the first
/// `AieraModule::load`; module load, unload, and diagnostics events are only
/// visible once a subscriber is installed. Browser builds leave the subscriber
/// to the embedding page.
///
/// ```
/// use aiera_telemetry::{LoggingConfig, init_logging};
///
/// init_logging(&LoggingConfig::from_env())?;
/// tracing::info!("host started");
/// # Ok::<(), aiera_telemetry::TelemetryError>(())
/// ```
///
/// # Errors
///
/// Returns [`TelemetryError::Subscriber`] when a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> TelemetryResult<()> {
    let _ = BUILD_SHA.set(config.build_sha.clone());

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let json = (config.format == LogFormat::Json).then(|| fmt::layer().json().with_target(true));
    let pretty = (config.format == LogFormat::Pretty).then(|| fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
        .map_err(|source| TelemetryError::Subscriber { source })
}

/// Build identifier recorded by [`init_logging`], or `dev` before it runs.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}
