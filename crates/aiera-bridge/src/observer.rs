//! Optional diagnostics hook for bridge traffic.
//!
//! The bridge never logs on its own. Callers that want visibility into dropped
//! or failed messages install an observer.

use std::fmt::{self, Display, Formatter};

use aiera_events::EventBusError;

use crate::error::BridgeError;

/// Why an inbound window message was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Missing or different `ns` tag: unrelated page traffic.
    ForeignNamespace,
    /// Tagged for this protocol but without a usable event name.
    Malformed,
    /// Sender origin did not match the configured filter.
    OriginMismatch,
}

impl DropReason {
    /// Label used for logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForeignNamespace => "foreign_namespace",
            Self::Malformed => "malformed",
            Self::OriginMismatch => "origin_mismatch",
        }
    }
}

impl Display for DropReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Receives notifications about bridge traffic. Every method defaults to a no-op.
pub trait BridgeObserver {
    /// An outbound event was handed to the peer window.
    fn forwarded(&self, _event: &str) {}

    /// An inbound message was accepted and emitted locally as `in`.
    fn received(&self, _event: &str) {}

    /// An inbound message was ignored.
    fn dropped(&self, _reason: DropReason, _origin: &str) {}

    /// The peer window refused an outbound message.
    fn post_failed(&self, _event: &str, _error: &BridgeError) {}

    /// Local delivery of an accepted inbound message failed.
    fn dispatch_failed(&self, _event: &str, _error: &EventBusError) {}
}
