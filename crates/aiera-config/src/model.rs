//! Typed configuration models for a module embedding.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use aiera_events::EventValidation;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ConfigError, ConfigResult};
use crate::validate::parse_origin;

/// A bare web origin (`scheme://host[:port]`) in its serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(String);

impl Origin {
    /// Parse and normalise an origin.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when `raw` is not a bare
    /// `http`/`https` origin. The wildcard `*` is rejected here because it is
    /// not an origin; configuration uses an unset value for it.
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        parse_origin("origin", raw)?
            .ok_or_else(|| ConfigError::invalid("origin", raw, "wildcard_not_an_origin"))
    }

    pub(crate) const fn from_serialized(value: String) -> Self {
        Self(value)
    }

    /// Serialized origin, as compared against `MessageEvent.origin`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Origin {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl FromStr for Origin {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl AsRef<str> for Origin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Origin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Origin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Settings for one module embedding, shared by the host and frame sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleConfig {
    /// Peer origin. Outbound messages target it and inbound messages must come
    /// from it. `None` targets `*` and accepts any origin.
    pub target_origin: Option<Origin>,
    /// How strictly the bus enforces the event registry.
    pub validation: EventValidation,
    /// Log and count bridge traffic.
    pub diagnostics: bool,
    /// DOM id of the module iframe on the host page.
    pub frame_id: Option<String>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            target_origin: None,
            validation: EventValidation::infer(),
            diagnostics: false,
            frame_id: None,
        }
    }
}

impl ModuleConfig {
    /// Set the peer origin.
    #[must_use]
    pub fn with_target_origin(mut self, origin: Origin) -> Self {
        self.target_origin = Some(origin);
        self
    }

    /// Set the validation mode.
    #[must_use]
    pub const fn with_validation(mut self, validation: EventValidation) -> Self {
        self.validation = validation;
        self
    }

    /// Enable or disable diagnostics.
    #[must_use]
    pub const fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Set the iframe element id used on the host page.
    #[must_use]
    pub fn with_frame_id(mut self, frame_id: impl Into<String>) -> Self {
        self.frame_id = Some(frame_id.into());
        self
    }

    /// Origin filter in the form the bridge expects.
    #[must_use]
    pub fn origin_filter(&self) -> Option<&str> {
        self.target_origin.as_ref().map(Origin::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_parse_rejects_wildcard() {
        assert!(Origin::parse("*").is_err());
        assert!(matches!(
            "https://app.example.com".parse::<Origin>(),
            Ok(ref origin) if origin.as_str() == "https://app.example.com"
        ));
    }

    #[test]
    fn origin_serde_uses_plain_strings() -> anyhow::Result<()> {
        let origin = Origin::parse("https://app.example.com")?;
        assert_eq!(
            serde_json::to_string(&origin)?,
            "\"https://app.example.com\""
        );
        let decoded: Origin = serde_json::from_str("\"http://localhost:3000\"")?;
        assert_eq!(decoded.to_string(), "http://localhost:3000");
        assert!(serde_json::from_str::<Origin>("\"https://x.test/path\"").is_err());
        Ok(())
    }

    #[test]
    fn builders_set_each_field() -> anyhow::Result<()> {
        let config = ModuleConfig::default()
            .with_target_origin(Origin::parse("https://host.example.com")?)
            .with_validation(EventValidation::Lenient)
            .with_diagnostics(true)
            .with_frame_id("aiera-module");

        assert_eq!(config.origin_filter(), Some("https://host.example.com"));
        assert_eq!(config.validation, EventValidation::Lenient);
        assert!(config.diagnostics);
        assert_eq!(config.frame_id.as_deref(), Some("aiera-module"));
        Ok(())
    }

    #[test]
    fn default_is_wildcard_without_diagnostics() {
        let config = ModuleConfig::default();
        assert_eq!(config.origin_filter(), None);
        assert_eq!(config.validation, EventValidation::infer());
        assert!(!config.diagnostics);
    }
}
