//! Window bridge: forwards `out` bus traffic to a peer window and re-emits
//! accepted peer messages as `in`.
//!
//! # Design
//! - Direction is decided by the bus, never by the wire: every `out` emit is
//!   posted, every accepted inbound message becomes `in`. Echo loops cannot form
//!   because the bridge never listens to `in` and never emits `out`.
//! - Outbound traffic goes through a bus forwarder, so consumers clearing their
//!   listeners or failing in an `out` listener never cut the peer channel.
//! - One binding at a time. Setting up again replaces the previous binding;
//!   cleaning up twice is a no-op.
//! - Inbound filtering is silent. Drops are only visible through an observer.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use aiera_events::{Direction, Listener, Message, MessageBus};

use crate::observer::{BridgeObserver, DropReason};
use crate::transport::{InboundHandler, InboundMessage, MessageSource, PeerWindow, SourceRegistration};
use crate::wire::{ANY_ORIGIN, WireMessage};

/// Whether a bridge currently holds a window binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No window binding.
    Idle,
    /// Forwarding to and receiving from a peer window.
    Bridged,
}

struct ActiveBinding {
    forwarder: Listener,
    origin_filter: Option<String>,
    _registration: SourceRegistration,
}

/// Couples one [`MessageBus`] to a peer window.
pub struct WindowBridge {
    bus: MessageBus,
    source: Rc<dyn MessageSource>,
    observer: Option<Rc<dyn BridgeObserver>>,
    binding: RefCell<Option<ActiveBinding>>,
}

impl WindowBridge {
    /// Bridge for `bus`, receiving inbound messages from `source`.
    #[must_use]
    pub fn new(bus: MessageBus, source: Rc<dyn MessageSource>) -> Self {
        Self {
            bus,
            source,
            observer: None,
            binding: RefCell::new(None),
        }
    }

    /// Attach a diagnostics observer. Applies to bindings set up afterwards.
    #[must_use]
    pub fn with_observer(mut self, observer: Rc<dyn BridgeObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Bus this bridge serves.
    #[must_use]
    pub const fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Current binding state.
    #[must_use]
    pub fn state(&self) -> BridgeState {
        if self.binding.borrow().is_some() {
            BridgeState::Bridged
        } else {
            BridgeState::Idle
        }
    }

    /// Origin filter of the active binding, if any.
    #[must_use]
    pub fn origin_filter(&self) -> Option<String> {
        self.binding
            .borrow()
            .as_ref()
            .and_then(|binding| binding.origin_filter.clone())
    }

    /// Start bridging to `peer`.
    ///
    /// Inbound messages are accepted when tagged with the module namespace and,
    /// if `origin_filter` is set, sent from exactly that origin. Outbound
    /// messages target `origin_filter`, or any origin when it is `None`.
    /// An existing binding is torn down first.
    pub fn setup_window_messaging(&self, peer: Rc<dyn PeerWindow>, origin_filter: Option<&str>) {
        self.cleanup_window_messaging();

        let origin_filter = origin_filter.map(str::to_string);
        let forwarder = {
            let target = origin_filter
                .clone()
                .unwrap_or_else(|| ANY_ORIGIN.to_string());
            let observer = self.observer.clone();
            Listener::new(move |message| {
                forward(peer.as_ref(), &target, message, observer.as_deref());
            })
        };
        let handler: InboundHandler = {
            let bus = self.bus.clone();
            let filter = origin_filter.clone();
            let observer = self.observer.clone();
            Rc::new(move |inbound: InboundMessage| {
                receive(&bus, filter.as_deref(), observer.as_deref(), inbound);
            })
        };

        self.bus.forward(Direction::Out, &forwarder);
        let registration = self.source.listen(handler);
        *self.binding.borrow_mut() = Some(ActiveBinding {
            forwarder,
            origin_filter,
            _registration: registration,
        });
    }

    /// Stop bridging. Returns `false` when no binding was active.
    pub fn cleanup_window_messaging(&self) -> bool {
        let Some(binding) = self.binding.borrow_mut().take() else {
            return false;
        };
        self.bus.unforward(Direction::Out, &binding.forwarder);
        true
    }
}

impl Drop for WindowBridge {
    fn drop(&mut self) {
        self.cleanup_window_messaging();
    }
}

impl fmt::Debug for WindowBridge {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("WindowBridge")
            .field("state", &self.state())
            .field("origin_filter", &self.origin_filter())
            .finish_non_exhaustive()
    }
}

fn forward(
    peer: &dyn PeerWindow,
    target_origin: &str,
    message: &Message,
    observer: Option<&dyn BridgeObserver>,
) {
    let wire = WireMessage::new(message.event.clone(), message.data.clone());
    match peer.post_message(&wire, target_origin) {
        Ok(()) => {
            if let Some(observer) = observer {
                observer.forwarded(&message.event);
            }
        }
        Err(err) => {
            if let Some(observer) = observer {
                observer.post_failed(&message.event, &err);
            }
        }
    }
}

fn receive(
    bus: &MessageBus,
    origin_filter: Option<&str>,
    observer: Option<&dyn BridgeObserver>,
    inbound: InboundMessage,
) {
    let InboundMessage { origin, data } = inbound;
    let wire = match WireMessage::from_value(data) {
        Ok(wire) => wire,
        Err(reason) => {
            if let Some(observer) = observer {
                observer.dropped(reason, &origin);
            }
            return;
        }
    };
    if origin_filter.is_some_and(|expected| expected != origin) {
        if let Some(observer) = observer {
            observer.dropped(DropReason::OriginMismatch, &origin);
        }
        return;
    }

    match bus.emit(&wire.event, wire.data, Direction::In) {
        Ok(_) => {
            if let Some(observer) = observer {
                observer.received(&wire.event);
            }
        }
        Err(err) => {
            if let Some(observer) = observer {
                observer.dispatch_failed(&wire.event, &err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BridgeError, BridgeResult};
    use aiera_events::{EventBusError, EventRegistry, EventValidation, ListenerError};
    use serde_json::{Value, json};
    use std::cell::Cell;

    #[derive(Default)]
    struct FakePeer {
        posts: RefCell<Vec<(WireMessage, String)>>,
        refuse: Cell<bool>,
    }

    impl PeerWindow for FakePeer {
        fn post_message(&self, message: &WireMessage, target_origin: &str) -> BridgeResult<()> {
            if self.refuse.get() {
                return Err(BridgeError::Post {
                    event: message.event.clone(),
                    detail: "refused".into(),
                });
            }
            self.posts
                .borrow_mut()
                .push((message.clone(), target_origin.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeSource {
        handler: Rc<RefCell<Option<InboundHandler>>>,
        registrations: Cell<u32>,
    }

    impl FakeSource {
        fn deliver(&self, origin: &str, data: Value) {
            let handler = self.handler.borrow().clone();
            if let Some(handler) = handler {
                handler(InboundMessage {
                    origin: origin.to_string(),
                    data,
                });
            }
        }

        fn is_listening(&self) -> bool {
            self.handler.borrow().is_some()
        }
    }

    impl MessageSource for FakeSource {
        fn listen(&self, handler: InboundHandler) -> SourceRegistration {
            self.registrations.set(self.registrations.get() + 1);
            *self.handler.borrow_mut() = Some(handler);
            let slot = Rc::clone(&self.handler);
            SourceRegistration::new(move || {
                slot.borrow_mut().take();
            })
        }
    }

    #[derive(Default)]
    struct Tally {
        forwarded: RefCell<Vec<String>>,
        received: RefCell<Vec<String>>,
        dropped: RefCell<Vec<DropReason>>,
        post_failures: Cell<u32>,
        dispatch_failures: Cell<u32>,
    }

    impl BridgeObserver for Tally {
        fn forwarded(&self, event: &str) {
            self.forwarded.borrow_mut().push(event.to_string());
        }

        fn received(&self, event: &str) {
            self.received.borrow_mut().push(event.to_string());
        }

        fn dropped(&self, reason: DropReason, _origin: &str) {
            self.dropped.borrow_mut().push(reason);
        }

        fn post_failed(&self, _event: &str, _error: &BridgeError) {
            self.post_failures.set(self.post_failures.get() + 1);
        }

        fn dispatch_failed(&self, _event: &str, _error: &EventBusError) {
            self.dispatch_failures.set(self.dispatch_failures.get() + 1);
        }
    }

    const HOST: &str = "https://host.example.com";

    fn fixture(validation: EventValidation) -> (MessageBus, Rc<FakeSource>, Rc<Tally>, WindowBridge) {
        let bus = MessageBus::with_registry(EventRegistry::standard(), validation);
        let source = Rc::new(FakeSource::default());
        let tally = Rc::new(Tally::default());
        let bridge = WindowBridge::new(bus.clone(), source.clone())
            .with_observer(tally.clone());
        (bus, source, tally, bridge)
    }

    fn inbound_log(bus: &MessageBus, event: &str) -> Rc<RefCell<Vec<Message>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let listener = {
            let log = Rc::clone(&log);
            Listener::new(move |message| log.borrow_mut().push(message.clone()))
        };
        bus.on(event, &listener, Direction::In).expect("on");
        log
    }

    #[test]
    fn outbound_emits_are_posted_with_target_origin() {
        let (bus, _source, tally, bridge) = fixture(EventValidation::Strict);
        let peer = Rc::new(FakePeer::default());
        bridge.setup_window_messaging(peer.clone(), Some(HOST));
        assert_eq!(bridge.state(), BridgeState::Bridged);
        assert_eq!(bridge.origin_filter().as_deref(), Some(HOST));

        bus.emit("instrument-selected", json!({ "ticker": "TICK" }), Direction::Out)
            .expect("emit");
        bus.emit("pause-audio", json!({}), Direction::In).expect("emit in");

        let posts = peer.posts.borrow();
        assert_eq!(posts.len(), 1);
        assert_eq!(
            posts[0],
            (
                WireMessage::new("instrument-selected", json!({ "ticker": "TICK" })),
                HOST.to_string()
            )
        );
        assert_eq!(*tally.forwarded.borrow(), ["instrument-selected"]);
    }

    #[test]
    fn missing_filter_posts_to_any_origin_and_trusts_all_senders() {
        let (bus, source, _tally, bridge) = fixture(EventValidation::Strict);
        let peer = Rc::new(FakePeer::default());
        bridge.setup_window_messaging(peer.clone(), None);
        let log = inbound_log(&bus, "pause-audio");

        bus.emit("pause-audio", json!({}), Direction::Out).expect("emit");
        assert_eq!(peer.posts.borrow()[0].1, ANY_ORIGIN);

        source.deliver(
            "https://anywhere.example",
            json!({ "ns": "aiera", "event": "pause-audio", "data": {} }),
        );
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn accepted_messages_are_emitted_inbound() {
        let (bus, source, tally, bridge) = fixture(EventValidation::Strict);
        bridge.setup_window_messaging(Rc::new(FakePeer::default()), Some(HOST));
        let log = inbound_log(&bus, "instrument-selected");
        let outbound = Rc::new(Cell::new(0));
        {
            let outbound = Rc::clone(&outbound);
            bus.on(
                "instrument-selected",
                &Listener::new(move |_| outbound.set(outbound.get() + 1)),
                Direction::Out,
            )
            .expect("on");
        }

        source.deliver(
            HOST,
            json!({ "ns": "aiera", "event": "instrument-selected", "data": { "ticker": "TICK" } }),
        );

        assert_eq!(
            log.borrow().as_slice(),
            &[Message {
                event: "instrument-selected".into(),
                direction: Direction::In,
                data: json!({ "ticker": "TICK" }),
            }]
        );
        assert_eq!(outbound.get(), 0);
        assert_eq!(*tally.received.borrow(), ["instrument-selected"]);
    }

    #[test]
    fn foreign_and_mismatched_messages_never_reach_listeners() {
        let (bus, source, tally, bridge) = fixture(EventValidation::Lenient);
        bridge.setup_window_messaging(Rc::new(FakePeer::default()), Some(HOST));
        let log = inbound_log(&bus, "pause-audio");

        source.deliver(HOST, json!({ "ns": "other", "event": "pause-audio", "data": {} }));
        source.deliver(HOST, json!({ "type": "webpackOk" }));
        source.deliver(HOST, json!({ "ns": "aiera", "data": {} }));
        source.deliver(
            "https://evil.example.com",
            json!({ "ns": "aiera", "event": "pause-audio", "data": {} }),
        );

        assert!(log.borrow().is_empty());
        assert_eq!(
            tally.dropped.borrow().as_slice(),
            &[
                DropReason::ForeignNamespace,
                DropReason::ForeignNamespace,
                DropReason::Malformed,
                DropReason::OriginMismatch,
            ]
        );
    }

    #[test]
    fn cleanup_stops_both_directions_and_is_idempotent() {
        let (bus, source, _tally, bridge) = fixture(EventValidation::Strict);
        let peer = Rc::new(FakePeer::default());
        bridge.setup_window_messaging(peer.clone(), Some(HOST));
        let log = inbound_log(&bus, "pause-audio");

        assert!(bridge.cleanup_window_messaging());
        assert!(!bridge.cleanup_window_messaging());
        assert_eq!(bridge.state(), BridgeState::Idle);
        assert!(!source.is_listening());
        assert_eq!(bus.forwarder_count(Direction::Out), 0);

        bus.emit("pause-audio", json!({}), Direction::Out).expect("emit");
        assert!(peer.posts.borrow().is_empty());
        source.deliver(HOST, json!({ "ns": "aiera", "event": "pause-audio", "data": {} }));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn clearing_listeners_keeps_the_bridge_forwarding() {
        let (bus, source, _tally, bridge) = fixture(EventValidation::Strict);
        let peer = Rc::new(FakePeer::default());
        bridge.setup_window_messaging(peer.clone(), Some(HOST));
        bus.on("pause-audio", &Listener::new(|_| {}), Direction::Out)
            .expect("on");

        bus.remove_all_listeners();
        assert_eq!(bridge.state(), BridgeState::Bridged);
        assert_eq!(bus.forwarder_count(Direction::Out), 1);

        bus.emit("pause-audio", json!({}), Direction::Out).expect("emit");
        assert_eq!(peer.posts.borrow().len(), 1);

        let log = inbound_log(&bus, "pause-audio");
        source.deliver(HOST, json!({ "ns": "aiera", "event": "pause-audio", "data": {} }));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn failing_outbound_listener_still_posts() {
        let (bus, _source, tally, bridge) = fixture(EventValidation::Strict);
        let peer = Rc::new(FakePeer::default());
        bridge.setup_window_messaging(peer.clone(), None);
        bus.on(
            "pause-audio",
            &Listener::fallible(|_| Err(ListenerError::callback("boom"))),
            Direction::Out,
        )
        .expect("on");

        let result = bus.emit("pause-audio", json!({}), Direction::Out);
        assert!(matches!(result, Err(EventBusError::Listener { .. })));
        assert_eq!(peer.posts.borrow().len(), 1);
        assert_eq!(*tally.forwarded.borrow(), ["pause-audio"]);
    }

    #[test]
    fn cleanup_without_setup_is_a_no_op() {
        let (_bus, source, _tally, bridge) = fixture(EventValidation::Strict);
        assert!(!bridge.cleanup_window_messaging());
        assert_eq!(source.registrations.get(), 0);
    }

    #[test]
    fn setup_twice_replaces_the_binding() {
        let (bus, source, _tally, bridge) = fixture(EventValidation::Strict);
        let first = Rc::new(FakePeer::default());
        let second = Rc::new(FakePeer::default());
        bridge.setup_window_messaging(first.clone(), Some(HOST));
        bridge.setup_window_messaging(second.clone(), None);

        assert_eq!(bus.forwarder_count(Direction::Out), 1);
        assert_eq!(source.registrations.get(), 2);
        assert!(source.is_listening());
        assert_eq!(bridge.origin_filter(), None);

        bus.emit("pause-audio", json!({}), Direction::Out).expect("emit");
        assert!(first.posts.borrow().is_empty());
        assert_eq!(second.posts.borrow().len(), 1);
    }

    #[test]
    fn refused_posts_are_reported_not_raised() {
        let (bus, _source, tally, bridge) = fixture(EventValidation::Strict);
        let peer = Rc::new(FakePeer::default());
        peer.refuse.set(true);
        bridge.setup_window_messaging(peer, None);

        assert_eq!(
            bus.emit("pause-audio", json!({}), Direction::Out).expect("emit"),
            1
        );
        assert_eq!(tally.post_failures.get(), 1);
        assert!(tally.forwarded.borrow().is_empty());
    }

    #[test]
    fn inbound_dispatch_failures_are_swallowed() {
        let (bus, source, tally, bridge) = fixture(EventValidation::Strict);
        bridge.setup_window_messaging(Rc::new(FakePeer::default()), None);

        source.deliver(HOST, json!({ "ns": "aiera", "event": "unknown-event", "data": 1 }));
        assert_eq!(tally.dispatch_failures.get(), 1);
        assert!(tally.received.borrow().is_empty());
        assert_eq!(bus.forwarder_count(Direction::Out), 1);
    }

    #[test]
    fn dropping_the_bridge_releases_the_binding() {
        let (bus, source, _tally, bridge) = fixture(EventValidation::Strict);
        bridge.setup_window_messaging(Rc::new(FakePeer::default()), None);
        drop(bridge);
        assert!(!source.is_listening());
        assert!(bus.is_empty());
    }
}
