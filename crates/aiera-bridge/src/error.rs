//! # Design
//!
//! - Bridge errors only describe the outbound path; inbound problems are drop reasons.
//! - Keep error messages constant while carrying context fields for debugging.

use thiserror::Error;

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised while handing a message to the peer window.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Message could not be encoded to the wire format.
    #[error("failed to encode wire message")]
    Encode {
        /// Event being encoded.
        event: String,
        /// Source serialization error.
        source: serde_json::Error,
    },
    /// Peer window refused the message.
    #[error("peer window rejected message")]
    Post {
        /// Event being posted.
        event: String,
        /// Transport-provided failure detail.
        detail: String,
    },
    /// Peer window handle could not be obtained.
    #[error("peer window unavailable")]
    PeerUnavailable {
        /// Which peer was requested (`parent`, `frame`).
        peer: &'static str,
    },
}
