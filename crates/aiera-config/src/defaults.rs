//! Environment variable names and default values for module configuration.
//!
//! # Design
//! - Centralize variable names so the loader and its callers agree on them.

/// Target origin for outbound messages and inbound filtering.
pub const ENV_TARGET_ORIGIN: &str = "AIERA_TARGET_ORIGIN";
/// Event validation mode (`strict` / `lenient`).
pub const ENV_EVENT_VALIDATION: &str = "AIERA_EVENT_VALIDATION";
/// Enables bridge diagnostics.
pub const ENV_DIAGNOSTICS: &str = "AIERA_DIAGNOSTICS";
/// DOM id of the module iframe on the host page.
pub const ENV_FRAME_ID: &str = "AIERA_FRAME_ID";

/// Wildcard accepted in place of an origin; equivalent to leaving it unset.
pub(crate) const WILDCARD_ORIGIN: &str = "*";
