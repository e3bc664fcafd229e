//! Message bus routing.
//!
//! # Design
//! - Listeners are partitioned by event name and then by direction; an emit only
//!   ever reads the lane for its own direction.
//! - Delivery snapshots the lane first and never holds the state borrow while a
//!   callback runs, so callbacks may call `on`/`off`/`emit` on the same bus.
//! - Taps see every event of one direction and run after the keyed listeners.
//! - Forwarders belong to whoever bridges the bus, not to its consumers: they run
//!   before any listener and survive `remove_all_listeners`.

use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::{EventBusError, EventBusResult};
use crate::message::{Direction, Listener, Message, TypedMessage};
use crate::payloads::RegistryEvent;
use crate::topics::{EventRegistry, EventValidation};

#[derive(Default)]
struct Lanes {
    inbound: Vec<Listener>,
    outbound: Vec<Listener>,
}

impl Lanes {
    fn lane(&self, direction: Direction) -> &Vec<Listener> {
        match direction {
            Direction::In => &self.inbound,
            Direction::Out => &self.outbound,
        }
    }

    fn lane_mut(&mut self, direction: Direction) -> &mut Vec<Listener> {
        match direction {
            Direction::In => &mut self.inbound,
            Direction::Out => &mut self.outbound,
        }
    }

    fn is_empty(&self) -> bool {
        self.inbound.is_empty() && self.outbound.is_empty()
    }

    fn len(&self) -> usize {
        self.inbound.len() + self.outbound.len()
    }
}

fn remove_last(lane: &mut Vec<Listener>, listener: &Listener) -> bool {
    lane.iter()
        .rposition(|candidate| candidate.ptr_eq(listener))
        .map(|index| lane.remove(index))
        .is_some()
}

#[derive(Default)]
struct BusState {
    routes: HashMap<String, Lanes>,
    taps: Lanes,
    forwarders: Lanes,
}

struct BusInner {
    registry: EventRegistry,
    validation: EventValidation,
    state: RefCell<BusState>,
}

/// In-process publish/subscribe bus with directional channels.
///
/// Cloning yields another handle to the same bus. The bus is single-threaded.
#[derive(Clone)]
pub struct MessageBus {
    inner: Rc<BusInner>,
}

impl MessageBus {
    /// Bus over the built-in registry with build-inferred validation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(EventRegistry::standard(), EventValidation::infer())
    }

    /// Bus over a custom registry and validation mode.
    #[must_use]
    pub fn with_registry(registry: EventRegistry, validation: EventValidation) -> Self {
        Self {
            inner: Rc::new(BusInner {
                registry,
                validation,
                state: RefCell::new(BusState::default()),
            }),
        }
    }

    /// Registry backing this bus.
    #[must_use]
    pub fn registry(&self) -> &EventRegistry {
        &self.inner.registry
    }

    /// Validation mode this bus was built with.
    #[must_use]
    pub fn validation(&self) -> EventValidation {
        self.inner.validation
    }

    /// Register `listener` for every emit of `event` in `direction`.
    ///
    /// Registering the same listener twice yields two independent entries.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::UnknownEvent`] in strict mode when `event` is not registered.
    pub fn on(&self, event: &str, listener: &Listener, direction: Direction) -> EventBusResult<()> {
        if self.inner.validation == EventValidation::Strict {
            self.inner.registry.require(event)?;
        }
        self.state()
            .routes
            .entry(event.to_string())
            .or_default()
            .lane_mut(direction)
            .push(listener.clone());
        Ok(())
    }

    /// Remove one registration of `listener` for `(event, direction)`.
    ///
    /// Returns `false` when no such registration exists.
    pub fn off(&self, event: &str, listener: &Listener, direction: Direction) -> bool {
        let mut state = self.state();
        let Some(lanes) = state.routes.get_mut(event) else {
            return false;
        };
        let removed = remove_last(lanes.lane_mut(direction), listener);
        if lanes.is_empty() {
            state.routes.remove(event);
        }
        removed
    }

    /// Hand `data` to the forwarders of `direction`, then deliver it to every
    /// listener registered for `(event, direction)` in registration order, then
    /// to the taps of `direction`.
    ///
    /// Returns the number of callbacks invoked, forwarders included.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`EventBusError::UnknownEvent`] or
    /// [`EventBusError::InvalidPayload`] before delivering anything. A failing
    /// listener stops delivery and surfaces as [`EventBusError::Listener`].
    pub fn emit(&self, event: &str, data: Value, direction: Direction) -> EventBusResult<usize> {
        if self.inner.validation == EventValidation::Strict {
            self.inner.registry.validate(event, &data)?;
        }

        let recipients = {
            let state = self.inner.state.borrow();
            let mut recipients = state.forwarders.lane(direction).clone();
            if let Some(lanes) = state.routes.get(event) {
                recipients.extend(lanes.lane(direction).iter().cloned());
            }
            recipients.extend(state.taps.lane(direction).iter().cloned());
            recipients
        };

        let message = Message {
            event: event.to_string(),
            direction,
            data,
        };
        for listener in &recipients {
            listener
                .call(&message)
                .map_err(|source| EventBusError::Listener {
                    event: message.event.clone(),
                    direction,
                    source,
                })?;
        }
        Ok(recipients.len())
    }

    /// Drop every registration and tap on this bus. Forwarders stay installed.
    pub fn remove_all_listeners(&self) {
        let mut state = self.state();
        state.routes.clear();
        state.taps = Lanes::default();
    }

    /// Register a listener that sees every event emitted in `direction`.
    pub fn tap(&self, direction: Direction, listener: &Listener) {
        self.state().taps.lane_mut(direction).push(listener.clone());
    }

    /// Remove one tap registration. Returns `false` when none matched.
    pub fn untap(&self, direction: Direction, listener: &Listener) -> bool {
        remove_last(self.state().taps.lane_mut(direction), listener)
    }

    /// Install a forwarder for `direction`. Forwarders see every event of that
    /// direction before any listener does and are only removed by
    /// [`MessageBus::unforward`].
    pub fn forward(&self, direction: Direction, forwarder: &Listener) {
        self.state()
            .forwarders
            .lane_mut(direction)
            .push(forwarder.clone());
    }

    /// Remove one forwarder. Returns `false` when none matched.
    pub fn unforward(&self, direction: Direction, forwarder: &Listener) -> bool {
        remove_last(self.state().forwarders.lane_mut(direction), forwarder)
    }

    /// Typed registration: decode the payload as `E` before invoking `callback`.
    ///
    /// Returns the listener handle to pass to [`MessageBus::off`].
    ///
    /// # Errors
    ///
    /// Same as [`MessageBus::on`].
    pub fn on_event<E, F>(&self, direction: Direction, callback: F) -> EventBusResult<Listener>
    where
        E: RegistryEvent,
        F: Fn(TypedMessage<E>) + 'static,
    {
        let listener = Listener::typed::<E, F>(callback);
        self.on(E::NAME, &listener, direction)?;
        Ok(listener)
    }

    /// Typed emit: serialize `payload` and emit it under `E::NAME`.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::InvalidPayload`] when the payload cannot be
    /// serialized, otherwise the same as [`MessageBus::emit`].
    pub fn emit_event<E: RegistryEvent>(
        &self,
        payload: &E,
        direction: Direction,
    ) -> EventBusResult<usize> {
        let data = serde_json::to_value(payload).map_err(|source| {
            EventBusError::InvalidPayload {
                event: E::NAME.to_string(),
                source,
            }
        })?;
        self.emit(E::NAME, data, direction)
    }

    /// Number of listeners registered for `(event, direction)`, taps excluded.
    #[must_use]
    pub fn listener_count(&self, event: &str, direction: Direction) -> usize {
        self.inner
            .state
            .borrow()
            .routes
            .get(event)
            .map_or(0, |lanes| lanes.lane(direction).len())
    }

    /// Number of taps registered for `direction`.
    #[must_use]
    pub fn tap_count(&self, direction: Direction) -> usize {
        self.inner.state.borrow().taps.lane(direction).len()
    }

    /// Number of forwarders installed for `direction`.
    #[must_use]
    pub fn forwarder_count(&self, direction: Direction) -> usize {
        self.inner.state.borrow().forwarders.lane(direction).len()
    }

    /// Returns `true` when no listener or tap is registered. Forwarders are
    /// not counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let state = self.inner.state.borrow();
        state.routes.is_empty() && state.taps.is_empty()
    }

    /// Returns `true` when both handles refer to the same bus.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn state(&self) -> RefMut<'_, BusState> {
        self.inner.state.borrow_mut()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for MessageBus {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        formatter
            .debug_struct("MessageBus")
            .field("validation", &self.inner.validation)
            .field("events", &state.routes.len())
            .field(
                "listeners",
                &state.routes.values().map(Lanes::len).sum::<usize>(),
            )
            .field("taps", &state.taps.len())
            .field("forwarders", &state.forwarders.len())
            .finish()
    }
}
