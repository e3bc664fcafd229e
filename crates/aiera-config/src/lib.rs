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

//! Module embedding configuration loaded from JSON, files, or the environment.
//!
//! Layout: `model.rs` (typed config models), `validate.rs` (validation/parsing
//! helpers), `loader.rs` (JSON, file, and environment sources),
//! `defaults.rs` (variable names).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::{ENV_DIAGNOSTICS, ENV_EVENT_VALIDATION, ENV_FRAME_ID, ENV_TARGET_ORIGIN};
pub use error::{ConfigError, ConfigResult};
pub use model::{ModuleConfig, Origin};
