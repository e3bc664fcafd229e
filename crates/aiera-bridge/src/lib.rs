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

//! Window bridge that carries message bus traffic across a `postMessage` boundary.
//!
//! Layout: `wire.rs` (wire format), `transport.rs` (peer/source seams),
//! `bridge.rs` (`WindowBridge`), `observer.rs` (diagnostics hook),
//! `web.rs` (browser transport, `wasm32` only).

pub mod bridge;
pub mod error;
pub mod observer;
pub mod transport;
pub mod wire;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use bridge::{BridgeState, WindowBridge};
pub use error::{BridgeError, BridgeResult};
pub use observer::{BridgeObserver, DropReason};
pub use transport::{InboundHandler, InboundMessage, MessageSource, PeerWindow, SourceRegistration};
pub use wire::{ANY_ORIGIN, NAMESPACE, WireMessage};
