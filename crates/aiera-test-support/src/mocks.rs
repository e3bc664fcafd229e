//! In-memory window transports for exercising the bridge without a browser.
//!
//! # Design
//! - `MemoryWindow::pair` links two windows; posts are queued on the receiving
//!   side and delivered only when the test calls `pump`, so ordering and
//!   re-entrancy are explicit.
//! - Target origins are enforced on post the way browsers do: a message aimed
//!   at another origin is discarded silently.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use aiera_bridge::{
    ANY_ORIGIN, BridgeError, BridgeResult, InboundHandler, InboundMessage, MessageSource,
    PeerWindow, SourceRegistration, WireMessage,
};
use serde_json::Value;

#[derive(Default)]
struct Handlers {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, InboundHandler)>>,
}

impl Handlers {
    fn register(self: &Rc<Self>, handler: InboundHandler) -> SourceRegistration {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, handler));
        let handlers = Rc::downgrade(self);
        SourceRegistration::new(move || {
            if let Some(handlers) = handlers.upgrade() {
                handlers.entries.borrow_mut().retain(|(entry, _)| *entry != id);
            }
        })
    }

    fn dispatch(&self, message: &InboundMessage) -> usize {
        let snapshot: Vec<InboundHandler> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        for handler in &snapshot {
            handler(message.clone());
        }
        snapshot.len()
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

struct WindowState {
    origin: String,
    queue: RefCell<VecDeque<InboundMessage>>,
    handlers: Rc<Handlers>,
    discarded: Cell<usize>,
}

impl WindowState {
    fn new(origin: &str) -> Rc<Self> {
        Rc::new(Self {
            origin: origin.to_string(),
            queue: RefCell::new(VecDeque::new()),
            handlers: Rc::new(Handlers::default()),
            discarded: Cell::new(0),
        })
    }
}

/// One side of a pair of linked in-memory windows.
pub struct MemoryWindow {
    local: Rc<WindowState>,
    remote: Rc<WindowState>,
}

impl MemoryWindow {
    /// Create two windows that can post to each other.
    #[must_use]
    pub fn pair(first_origin: &str, second_origin: &str) -> (Self, Self) {
        let first = WindowState::new(first_origin);
        let second = WindowState::new(second_origin);
        (
            Self {
                local: Rc::clone(&first),
                remote: Rc::clone(&second),
            },
            Self {
                local: second,
                remote: first,
            },
        )
    }

    /// Origin this window reports on messages it sends.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.local.origin
    }

    /// Handle for posting to the other window of the pair.
    #[must_use]
    pub fn peer(&self) -> Rc<dyn PeerWindow> {
        Rc::new(MemoryPeer {
            sender_origin: self.local.origin.clone(),
            target: Rc::clone(&self.remote),
        })
    }

    /// This window as an inbound message source.
    #[must_use]
    pub fn source(&self) -> Rc<dyn MessageSource> {
        Rc::new(MemorySource {
            handlers: Rc::clone(&self.local.handlers),
        })
    }

    /// Queue a raw message on this window as if `origin` had posted it.
    pub fn inject(&self, origin: &str, data: Value) {
        self.local.queue.borrow_mut().push_back(InboundMessage {
            origin: origin.to_string(),
            data,
        });
    }

    /// Deliver every queued message to the registered handlers. Messages queued
    /// during delivery are delivered in the same call. Returns the number of
    /// messages taken from the queue.
    #[must_use]
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.local.queue.borrow_mut().pop_front();
            let Some(message) = next else {
                return delivered;
            };
            self.local.handlers.dispatch(&message);
            delivered += 1;
        }
    }

    /// Number of messages waiting for `pump`.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.local.queue.borrow().len()
    }

    /// Messages discarded because their target origin did not match this window.
    #[must_use]
    pub fn discarded(&self) -> usize {
        self.local.discarded.get()
    }

    /// Number of handlers currently listening on this window.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.local.handlers.len()
    }
}

/// Pump both windows until neither has queued messages. Returns the total
/// number of messages delivered.
#[must_use]
pub fn pump_until_idle(first: &MemoryWindow, second: &MemoryWindow) -> usize {
    let mut total = 0;
    loop {
        let delivered = first.pump() + second.pump();
        if delivered == 0 {
            return total;
        }
        total += delivered;
    }
}

struct MemoryPeer {
    sender_origin: String,
    target: Rc<WindowState>,
}

impl PeerWindow for MemoryPeer {
    fn post_message(&self, message: &WireMessage, target_origin: &str) -> BridgeResult<()> {
        if target_origin != ANY_ORIGIN && target_origin != self.target.origin {
            self.target.discarded.set(self.target.discarded.get() + 1);
            return Ok(());
        }
        let data = serde_json::to_value(message).map_err(|source| BridgeError::Encode {
            event: message.event.clone(),
            source,
        })?;
        self.target.queue.borrow_mut().push_back(InboundMessage {
            origin: self.sender_origin.clone(),
            data,
        });
        Ok(())
    }
}

struct MemorySource {
    handlers: Rc<Handlers>,
}

impl MessageSource for MemorySource {
    fn listen(&self, handler: InboundHandler) -> SourceRegistration {
        self.handlers.register(handler)
    }
}

/// Message source driven directly by the test; deliveries are synchronous.
#[derive(Default)]
pub struct ManualSource {
    handlers: Rc<Handlers>,
}

impl ManualSource {
    /// Create a source with no listeners.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Deliver a raw message to every current listener. Returns how many
    /// listeners saw it.
    #[must_use]
    pub fn deliver(&self, origin: &str, data: Value) -> usize {
        self.handlers.dispatch(&InboundMessage {
            origin: origin.to_string(),
            data,
        })
    }

    /// Number of listeners currently registered.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.handlers.len()
    }
}

impl MessageSource for ManualSource {
    fn listen(&self, handler: InboundHandler) -> SourceRegistration {
        self.handlers.register(handler)
    }
}

/// One message captured by a [`RecordingPeer`].
#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
    /// The message as posted.
    pub message: WireMessage,
    /// Target origin requested by the sender.
    pub target_origin: String,
}

/// Peer that records every post, optionally refusing them.
#[derive(Default)]
pub struct RecordingPeer {
    posted: RefCell<Vec<PostedMessage>>,
    refuse: Cell<bool>,
}

impl RecordingPeer {
    /// Create a peer that accepts every post.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Create a peer that rejects every post with [`BridgeError::Post`].
    #[must_use]
    pub fn refusing() -> Rc<Self> {
        let peer = Self::default();
        peer.refuse.set(true);
        Rc::new(peer)
    }

    /// Copy of everything posted so far.
    #[must_use]
    pub fn posted(&self) -> Vec<PostedMessage> {
        self.posted.borrow().clone()
    }

    /// Event names posted so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.posted
            .borrow()
            .iter()
            .map(|posted| posted.message.event.clone())
            .collect()
    }

    /// Number of recorded posts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.posted.borrow().len()
    }

    /// `true` when nothing has been posted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posted.borrow().is_empty()
    }
}

impl PeerWindow for RecordingPeer {
    fn post_message(&self, message: &WireMessage, target_origin: &str) -> BridgeResult<()> {
        if self.refuse.get() {
            return Err(BridgeError::Post {
                event: message.event.clone(),
                detail: "peer refused message".to_string(),
            });
        }
        self.posted.borrow_mut().push(PostedMessage {
            message: message.clone(),
            target_origin: target_origin.to_string(),
        });
        Ok(())
    }
}
