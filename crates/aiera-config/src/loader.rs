//! Loading module configuration from JSON documents, files, and the
//! environment.
//!
//! # Design
//! - Every source funnels through the same field parsers so validation is
//!   identical regardless of where a value came from.
//! - Environment access goes through a lookup closure so callers and tests can
//!   supply their own variables.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::defaults::{ENV_DIAGNOSTICS, ENV_EVENT_VALIDATION, ENV_FRAME_ID, ENV_TARGET_ORIGIN};
use crate::error::{ConfigError, ConfigResult};
use crate::model::ModuleConfig;
use crate::validate::{parse_flag, parse_frame_id, parse_origin, parse_validation};

/// Raw JSON document before validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ConfigDocument {
    #[serde(default, alias = "target_origin")]
    target_origin: Option<String>,
    #[serde(default)]
    validation: Option<String>,
    #[serde(default)]
    diagnostics: Option<bool>,
    #[serde(default, alias = "frame_id")]
    frame_id: Option<String>,
}

impl ModuleConfig {
    /// Parse a JSON configuration document.
    ///
    /// Keys accept `camelCase` or `snake_case`; missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown keys and
    /// [`ConfigError::InvalidField`] for values that fail validation.
    pub fn from_json_str(document: &str) -> ConfigResult<Self> {
        let raw: ConfigDocument =
            serde_json::from_str(document).map_err(|source| ConfigError::Parse { source })?;
        Self::from_document(raw)
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
    /// errors of [`ModuleConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            operation: "config.read",
            source,
        })?;
        let config = Self::from_json_str(&document)?;
        debug!(path = %path.display(), "loaded module configuration");
        Ok(config)
    }

    /// Build configuration from `AIERA_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a variable is set to an
    /// invalid value.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a variable is set to an
    /// invalid value.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_TARGET_ORIGIN) {
            config.target_origin = parse_origin(ENV_TARGET_ORIGIN, &raw)?;
        }
        if let Some(raw) = lookup(ENV_EVENT_VALIDATION) {
            config.validation = parse_validation(ENV_EVENT_VALIDATION, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DIAGNOSTICS) {
            config.diagnostics = parse_flag(ENV_DIAGNOSTICS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_FRAME_ID) {
            config.frame_id = parse_frame_id(ENV_FRAME_ID, &raw)?;
        }
        Ok(config)
    }

    fn from_document(raw: ConfigDocument) -> ConfigResult<Self> {
        let ConfigDocument {
            target_origin,
            validation,
            diagnostics,
            frame_id,
        } = raw;
        let mut config = Self::default();
        if let Some(origin) = target_origin.as_deref() {
            config.target_origin = parse_origin("target_origin", origin)?;
        }
        if let Some(mode) = validation.as_deref() {
            config.validation = parse_validation("validation", mode)?;
        }
        if let Some(diagnostics) = diagnostics {
            config.diagnostics = diagnostics;
        }
        if let Some(frame_id) = frame_id.as_deref() {
            config.frame_id = parse_frame_id("frame_id", frame_id)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aiera_events::EventValidation;
    use std::collections::HashMap;
    use std::io::Write as _;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn json_document_populates_all_fields() -> anyhow::Result<()> {
        let config = ModuleConfig::from_json_str(
            r#"{
                "targetOrigin": "https://dashboard.example.com",
                "validation": "lenient",
                "diagnostics": true,
                "frameId": "aiera-frame"
            }"#,
        )?;
        assert_eq!(config.origin_filter(), Some("https://dashboard.example.com"));
        assert_eq!(config.validation, EventValidation::Lenient);
        assert!(config.diagnostics);
        assert_eq!(config.frame_id.as_deref(), Some("aiera-frame"));
        Ok(())
    }

    #[test]
    fn json_document_accepts_snake_case_and_defaults() -> anyhow::Result<()> {
        let config = ModuleConfig::from_json_str(r#"{"target_origin": "*"}"#)?;
        assert_eq!(config, ModuleConfig::default());

        let empty = ModuleConfig::from_json_str("{}")?;
        assert_eq!(empty, ModuleConfig::default());
        Ok(())
    }

    #[test]
    fn json_document_rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            ModuleConfig::from_json_str(r#"{"origin": "https://x.test"}"#),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            ModuleConfig::from_json_str(r#"{"targetOrigin": "https://x.test/embed"}"#),
            Err(ConfigError::InvalidField {
                field: "target_origin",
                reason: "not_a_bare_origin",
                ..
            })
        ));
        assert!(matches!(
            ModuleConfig::from_json_str(r#"{"validation": "sometimes"}"#),
            Err(ConfigError::InvalidField {
                field: "validation",
                ..
            })
        ));
    }

    #[test]
    fn file_loading_reads_documents() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{"targetOrigin": "http://localhost:4200", "diagnostics": true}}"#
        )?;

        let config = ModuleConfig::from_path(file.path())?;
        assert_eq!(config.origin_filter(), Some("http://localhost:4200"));
        assert!(config.diagnostics);
        Ok(())
    }

    #[test]
    fn missing_file_reports_io_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let result = ModuleConfig::from_path(dir.path().join("absent.json"));
        assert!(matches!(
            result,
            Err(ConfigError::Io {
                operation: "config.read",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn lookup_reads_aiera_variables() -> anyhow::Result<()> {
        let config = ModuleConfig::from_lookup(lookup_from(&[
            (ENV_TARGET_ORIGIN, "https://host.example.com"),
            (ENV_EVENT_VALIDATION, "strict"),
            (ENV_DIAGNOSTICS, "yes"),
            (ENV_FRAME_ID, "module-frame"),
        ]))?;
        assert_eq!(config.origin_filter(), Some("https://host.example.com"));
        assert_eq!(config.validation, EventValidation::Strict);
        assert!(config.diagnostics);
        assert_eq!(config.frame_id.as_deref(), Some("module-frame"));
        Ok(())
    }

    #[test]
    fn lookup_without_variables_yields_defaults() -> anyhow::Result<()> {
        let config = ModuleConfig::from_lookup(|_| None)?;
        assert_eq!(config, ModuleConfig::default());
        Ok(())
    }

    #[test]
    fn lookup_reports_variable_name_on_failure() {
        let result = ModuleConfig::from_lookup(lookup_from(&[(ENV_DIAGNOSTICS, "perhaps")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidField {
                field: ENV_DIAGNOSTICS,
                ..
            })
        ));
    }
}
