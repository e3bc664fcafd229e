//! # Design
//!
//! - Centralize module-level errors for loading and host helpers.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for module operations.
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Module-level error type.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// Configuration loading failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: aiera_config::ConfigError,
    },
    /// A bus operation failed.
    #[error("message bus operation failed")]
    EventBus {
        /// Operation identifier.
        operation: &'static str,
        /// Source bus error.
        source: aiera_events::EventBusError,
    },
    /// The window bridge could not be established.
    #[error("window bridge operation failed")]
    Bridge {
        /// Operation identifier.
        operation: &'static str,
        /// Source bridge error.
        source: aiera_bridge::BridgeError,
    },
    /// Telemetry operations failed.
    #[cfg(not(target_arch = "wasm32"))]
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: aiera_telemetry::TelemetryError,
    },
    /// A required configuration value was not provided.
    #[error("missing configuration")]
    MissingConfig {
        /// Field name that was missing.
        field: &'static str,
    },
    /// A DOM element named by the configuration was not found.
    #[error("missing element")]
    MissingElement {
        /// Element id that was looked up.
        id: String,
    },
}

impl ModuleError {
    pub(crate) const fn config(
        operation: &'static str,
        source: aiera_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn event_bus(
        operation: &'static str,
        source: aiera_events::EventBusError,
    ) -> Self {
        Self::EventBus { operation, source }
    }

    #[cfg(any(target_arch = "wasm32", test))]
    pub(crate) const fn bridge(
        operation: &'static str,
        source: aiera_bridge::BridgeError,
    ) -> Self {
        Self::Bridge { operation, source }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub(crate) const fn telemetry(
        operation: &'static str,
        source: aiera_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn messages_are_constant_and_sources_preserved() {
        let config = ModuleError::config(
            "module.from_env",
            aiera_config::ConfigError::InvalidField {
                field: "AIERA_DIAGNOSTICS",
                value: Some("perhaps".to_string()),
                reason: "not_a_flag",
            },
        );
        assert_eq!(config.to_string(), "configuration operation failed");
        assert!(config.source().is_some());

        let bus = ModuleError::event_bus(
            "module.authenticate",
            aiera_events::EventBusError::UnknownEvent {
                event: "nope".to_string(),
            },
        );
        assert_eq!(bus.to_string(), "message bus operation failed");
        assert!(bus.source().is_some());

        let bridge = ModuleError::bridge(
            "module.attach_to_parent",
            aiera_bridge::BridgeError::PeerUnavailable { peer: "parent" },
        );
        assert_eq!(bridge.to_string(), "window bridge operation failed");

        let missing = ModuleError::MissingConfig { field: "frame_id" };
        assert_eq!(missing.to_string(), "missing configuration");
        let element = ModuleError::MissingElement {
            id: "aiera-frame".to_string(),
        };
        assert_eq!(element.to_string(), "missing element");
    }
}
