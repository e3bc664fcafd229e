//! Transport seams between the bridge and the host runtime.
//!
//! # Design
//! - `PeerWindow` is the outbound half: something that accepts `postMessage`.
//! - `MessageSource` is the inbound half: the local window's `message` event.
//! - Registrations remove themselves on drop, mirroring DOM listener guards.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::BridgeResult;
use crate::wire::WireMessage;

/// Window-like handle that accepts posted messages.
pub trait PeerWindow {
    /// Post `message` to the peer, restricted to `target_origin` (`*` for any).
    ///
    /// # Errors
    ///
    /// Returns an error when the transport refuses the message.
    fn post_message(&self, message: &WireMessage, target_origin: &str) -> BridgeResult<()>;
}

/// Raw message received from the host runtime, before any filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Origin of the sending window.
    pub origin: String,
    /// Message body decoded as JSON.
    pub data: Value,
}

/// Callback invoked for every raw inbound message.
pub type InboundHandler = Rc<dyn Fn(InboundMessage)>;

/// Source of inbound window messages, typically the local window.
pub trait MessageSource {
    /// Start delivering inbound messages to `handler` until the returned
    /// registration is dropped.
    fn listen(&self, handler: InboundHandler) -> SourceRegistration;
}

/// Guard for a [`MessageSource`] listener. Dropping it removes the listener.
#[must_use = "dropping a SourceRegistration removes the listener"]
pub struct SourceRegistration {
    remove: Option<Box<dyn FnOnce()>>,
}

impl SourceRegistration {
    /// Registration that runs `remove` when released.
    pub fn new<F>(remove: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            remove: Some(Box::new(remove)),
        }
    }
}

impl Drop for SourceRegistration {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for SourceRegistration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SourceRegistration")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn registration_runs_removal_once_on_drop() {
        let removed = Rc::new(Cell::new(0));
        let registration = {
            let removed = Rc::clone(&removed);
            SourceRegistration::new(move || removed.set(removed.get() + 1))
        };
        assert_eq!(removed.get(), 0);
        drop(registration);
        assert_eq!(removed.get(), 1);
    }
}
