//! Event bus error primitives.
//!
//! # Design
//! - Keep error messages constant while carrying context fields for debugging.
//! - Listener failures wrap the callback error so the `emit` caller sees the source.

use thiserror::Error;

use crate::message::Direction;

/// Error raised by bus operations (`on`, `emit`) in strict validation mode or
/// when a listener fails.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// Event name is not present in the registry.
    #[error("unknown event name")]
    UnknownEvent {
        /// Name supplied by the caller.
        event: String,
    },
    /// Payload does not match the shape registered for the event.
    #[error("event payload does not match registered shape")]
    InvalidPayload {
        /// Event whose payload failed validation.
        event: String,
        /// Decoding error produced while checking the payload.
        source: serde_json::Error,
    },
    /// A listener returned an error; delivery stopped at that listener.
    #[error("event listener failed")]
    Listener {
        /// Event being delivered.
        event: String,
        /// Direction of the emit call.
        direction: Direction,
        /// Error returned by the listener.
        source: ListenerError,
    },
}

impl EventBusError {
    /// Event name associated with the failure.
    #[must_use]
    pub fn event(&self) -> &str {
        match self {
            Self::UnknownEvent { event }
            | Self::InvalidPayload { event, .. }
            | Self::Listener { event, .. } => event,
        }
    }
}

/// Result wrapper for event bus operations.
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Error returned by a listener callback.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Typed listener could not decode the message payload.
    #[error("listener payload could not be decoded")]
    Decode {
        /// Event whose payload failed to decode.
        event: String,
        /// Source decoding error.
        source: serde_json::Error,
    },
    /// Callback reported a failure of its own.
    #[error("listener callback failed")]
    Callback {
        /// Human-readable failure detail.
        reason: String,
    },
}

impl ListenerError {
    /// Build a callback failure from a reason string.
    #[must_use]
    pub fn callback(reason: impl Into<String>) -> Self {
        Self::Callback {
            reason: reason.into(),
        }
    }
}

/// Error raised while defining an event registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two payload types were registered under the same event name.
    #[error("event name registered more than once")]
    DuplicateEvent {
        /// Name that was registered twice.
        event: &'static str,
    },
}

/// Result wrapper for registry construction.
pub type RegistryResult<T> = Result<T, RegistryError>;
