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

//! Aiera module entry point wiring the message bus to its peer window.
//!
//! Layout: `module.rs` (`AieraModule` lifecycle and host helpers),
//! `diagnostics.rs` (bridge observer), `web.rs` (browser constructors,
//! `wasm32` only), `hooks.rs` (Yew hook, `yew` feature).
//!
//! Native hosts install logging with `aiera_telemetry::init_logging` before
//! loading the first module.

/// Bridge observer backed by tracing and metrics.
pub mod diagnostics;
/// Module-level error types.
pub mod error;
/// Yew hook tying a listener to a component.
#[cfg(feature = "yew")]
pub mod hooks;
/// Module lifecycle.
pub mod module;
/// Browser constructors.
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use diagnostics::Diagnostics;
pub use error::{ModuleError, ModuleResult};
#[cfg(feature = "yew")]
pub use hooks::use_bus_listener;
pub use module::AieraModule;
#[cfg(target_arch = "wasm32")]
pub use web::{attach_to_parent, embed_frame, embed_frame_by_id};
