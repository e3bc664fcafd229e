//! Error types for telemetry operations.
//!
//! # Design
//! - Messages stay constant; the failing metric name travels as a field.

use prometheus::Error as PrometheusError;
use thiserror::Error;

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors raised while installing logging or maintaining bridge metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed, or installation failed.
    #[error("failed to install tracing subscriber")]
    Subscriber {
        /// Underlying subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A collector definition was rejected.
    #[error("failed to build metrics collector")]
    Collector {
        /// Metric the collector was built for.
        metric: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// A collector could not be added to the registry.
    #[error("failed to register metrics collector")]
    Register {
        /// Metric the collector was built for.
        metric: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Text exposition encoding failed.
    #[error("failed to render metrics")]
    Render {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Encoded exposition was not UTF-8.
    #[error("rendered metrics were not valid utf-8")]
    Utf8 {
        /// Underlying conversion error.
        source: std::string::FromUtf8Error,
    },
}

impl TelemetryError {
    /// Metric tied to the failure, when there is one.
    #[must_use]
    pub const fn metric(&self) -> Option<&'static str> {
        match self {
            Self::Collector { metric, .. } | Self::Register { metric, .. } => Some(metric),
            Self::Subscriber { .. } | Self::Render { .. } | Self::Utf8 { .. } => None,
        }
    }
}
