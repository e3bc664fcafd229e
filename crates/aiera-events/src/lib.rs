#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Typed event registry and directional message bus for embedded modules.
//!
//! Layout: `payloads.rs` (event payload types), `topics.rs` (registry and
//! validation mode), `message.rs` (directions, messages, listeners),
//! `routing.rs` (`MessageBus`), `binding.rs` (lifetime-scoped subscriptions),
//! `error.rs` (error types).

pub mod binding;
pub mod error;
pub mod message;
pub mod payloads;
pub mod routing;
pub mod topics;

pub use binding::{Subscription, SubscriptionSet, bind};
pub use error::{EventBusError, EventBusResult, ListenerError, RegistryError, RegistryResult};
pub use message::{Direction, Listener, Message, TypedMessage};
pub use payloads::{
    Authenticate, Authenticated, Configure, EventSelected, Instrument, InstrumentSelected,
    InstrumentsSelected, ModuleReady, PauseAudio, PlayAudio, RegistryEvent, SeekAudioSeconds,
};
pub use routing::MessageBus;
pub use topics::{EventRegistry, EventRegistryBuilder, EventValidation, RegisteredEvent};
