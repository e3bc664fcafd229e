//! Consumer bindings: listener registrations scoped to a consumer's lifetime.
//!
//! # Design
//! - `bind` registers immediately and hands back a guard.
//! - Detaching (explicitly or on drop) calls `off` with the exact registration triple.

use crate::error::EventBusResult;
use crate::message::{Direction, Listener};
use crate::routing::MessageBus;

/// Live registration owned by one consumer. Dropping it detaches the listener.
#[must_use = "dropping a Subscription detaches its listener immediately"]
#[derive(Debug)]
pub struct Subscription {
    bus: MessageBus,
    event: String,
    direction: Direction,
    listener: Listener,
    attached: bool,
}

impl Subscription {
    /// Event the listener is registered for.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Direction the listener is registered for.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Listener handle held by this subscription.
    #[must_use]
    pub const fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Returns `true` until the subscription is detached.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Detach now. Returns `false` when the bus had already dropped the
    /// registration (for example after `remove_all_listeners`).
    pub fn detach(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        if !self.attached {
            return false;
        }
        self.attached = false;
        self.bus.off(&self.event, &self.listener, self.direction)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Register `listener` on `bus` for `(event, direction)` until the returned
/// subscription is detached or dropped.
///
/// # Errors
///
/// Propagates [`MessageBus::on`] failures (unknown event in strict mode).
pub fn bind(
    bus: &MessageBus,
    event: &str,
    listener: Listener,
    direction: Direction,
) -> EventBusResult<Subscription> {
    bus.on(event, &listener, direction)?;
    Ok(Subscription {
        bus: bus.clone(),
        event: event.to_string(),
        direction,
        listener,
        attached: true,
    })
}

/// Group of subscriptions released together, e.g. everything one view registered.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a listener and keep the subscription in this set.
    ///
    /// # Errors
    ///
    /// Propagates [`bind`] failures.
    pub fn bind(
        &mut self,
        bus: &MessageBus,
        event: &str,
        listener: Listener,
        direction: Direction,
    ) -> EventBusResult<()> {
        let subscription = bind(bus, event, listener, direction)?;
        self.subscriptions.push(subscription);
        Ok(())
    }

    /// Take ownership of an existing subscription.
    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns `true` when no subscription is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Detach every held subscription.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
