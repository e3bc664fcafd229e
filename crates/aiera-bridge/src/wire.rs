//! Window-to-window wire format: `{ "ns": "aiera", "event": ..., "data": ... }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, BridgeResult};
use crate::observer::DropReason;

/// Namespace tag separating module traffic from unrelated `postMessage` traffic.
pub const NAMESPACE: &str = "aiera";

/// Target origin used when no origin filter is configured.
pub const ANY_ORIGIN: &str = "*";

/// Serialized bus event as it crosses the window boundary. Direction is not
/// carried: the receiver always treats it as inbound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Namespace tag, always [`NAMESPACE`] for messages this crate produces.
    pub ns: String,
    /// Event name.
    pub event: String,
    /// JSON payload.
    #[serde(default)]
    pub data: Value,
}

impl WireMessage {
    /// Wrap an event for the wire.
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            ns: NAMESPACE.to_string(),
            event: event.into(),
            data,
        }
    }

    /// Accept a received value as a module message.
    ///
    /// # Errors
    ///
    /// Returns [`DropReason::ForeignNamespace`] when the value is not tagged with
    /// [`NAMESPACE`] and [`DropReason::Malformed`] when it is tagged but does not
    /// carry an event name.
    pub fn from_value(value: Value) -> Result<Self, DropReason> {
        if value.get("ns").and_then(Value::as_str) != Some(NAMESPACE) {
            return Err(DropReason::ForeignNamespace);
        }
        serde_json::from_value(value).map_err(|_| DropReason::Malformed)
    }

    /// Encode as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Encode`] if serialization fails.
    pub fn to_json(&self) -> BridgeResult<String> {
        serde_json::to_string(self).map_err(|source| BridgeError::Encode {
            event: self.event.clone(),
            source,
        })
    }
}
