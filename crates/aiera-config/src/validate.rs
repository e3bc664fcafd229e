//! Validation helpers and parsing utilities for configuration values.

use aiera_events::EventValidation;
use url::Url;

use crate::defaults::WILDCARD_ORIGIN;
use crate::error::{ConfigError, ConfigResult};
use crate::model::Origin;

/// Parse an origin such as `https://app.example.com`.
///
/// The wildcard `*` and blank values yield `None`. Anything carrying a path,
/// query, fragment, or credentials is rejected.
pub(crate) fn parse_origin(field: &'static str, raw: &str) -> ConfigResult<Option<Origin>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == WILDCARD_ORIGIN {
        return Ok(None);
    }

    let url = Url::parse(trimmed).map_err(|_| ConfigError::invalid(field, raw, "not_a_url"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(field, raw, "unsupported_scheme"));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::invalid(field, raw, "missing_host"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ConfigError::invalid(field, raw, "credentials_not_allowed"));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::invalid(field, raw, "not_a_bare_origin"));
    }

    Ok(Some(Origin::from_serialized(
        url.origin().ascii_serialization(),
    )))
}

pub(crate) fn parse_validation(field: &'static str, raw: &str) -> ConfigResult<EventValidation> {
    EventValidation::parse(raw).ok_or_else(|| ConfigError::invalid(field, raw, "unknown_mode"))
}

pub(crate) fn parse_flag(field: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::invalid(field, raw, "not_a_flag")),
    }
}

pub(crate) fn parse_frame_id(field: &'static str, raw: &str) -> ConfigResult<Option<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(field, raw, "contains_whitespace"));
    }
    Ok(Some(trimmed.to_string()))
}
