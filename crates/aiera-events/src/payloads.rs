//! Event payload types carried between the host page and embedded modules.
//!
//! Field names follow the camelCase JSON the host-side JavaScript API emits.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Binds a payload type to the single event name it travels under.
pub trait RegistryEvent: Serialize + DeserializeOwned + 'static {
    /// Event name on the bus and on the wire.
    const NAME: &'static str;
}

/// Tradable instrument reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Ticker symbol.
    pub ticker: String,
    /// Exchange code when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// Display name when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Instrument {
    /// Instrument identified by ticker only.
    #[must_use]
    pub fn ticker(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            exchange: None,
            name: None,
        }
    }
}

/// Host hands the module a set of API credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authenticate {
    /// Bearer token for the data API.
    pub access_token: String,
    /// Token used to renew the access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl RegistryEvent for Authenticate {
    const NAME: &'static str = "authenticate";
}

/// Module confirms that authentication succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticated {}

impl RegistryEvent for Authenticated {
    const NAME: &'static str = "authenticated";
}

/// Host adjusts module presentation options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configure {
    /// Hide the module's settings affordances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_settings: Option<bool>,
    /// Module-specific options, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl RegistryEvent for Configure {
    const NAME: &'static str = "configure";
}

/// A single instrument was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentSelected(pub Instrument);

impl RegistryEvent for InstrumentSelected {
    const NAME: &'static str = "instrument-selected";
}

/// The watchlist of instruments was replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentsSelected(pub Vec<Instrument>);

impl RegistryEvent for InstrumentsSelected {
    const NAME: &'static str = "instruments-selected";
}

/// An event (earnings call, presentation) was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSelected {
    /// Identifier of the selected event.
    pub event_id: String,
    /// Event title when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl RegistryEvent for EventSelected {
    const NAME: &'static str = "event-selected";
}

/// Seek the active recording to an absolute offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekAudioSeconds {
    /// Offset from the start of the recording, in seconds.
    pub seconds: f64,
}

impl RegistryEvent for SeekAudioSeconds {
    const NAME: &'static str = "seek-audio-seconds";
}

/// Start playback of an event recording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAudio {
    /// Event whose recording should play.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Direct media URL when the host already resolved it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl RegistryEvent for PlayAudio {
    const NAME: &'static str = "play-audio";
}

/// Pause the active recording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseAudio {}

impl RegistryEvent for PauseAudio {
    const NAME: &'static str = "pause-audio";
}

/// Module finished booting and is ready for host messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReady {}

impl RegistryEvent for ModuleReady {
    const NAME: &'static str = "module-ready";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payloads_use_host_field_names() {
        let auth = Authenticate {
            access_token: "a".into(),
            refresh_token: Some("r".into()),
        };
        assert_eq!(
            serde_json::to_value(&auth).expect("serialize"),
            json!({ "accessToken": "a", "refreshToken": "r" })
        );

        let selected = InstrumentSelected(Instrument::ticker("TICK"));
        assert_eq!(
            serde_json::to_value(&selected).expect("serialize"),
            json!({ "ticker": "TICK" })
        );
    }

    #[test]
    fn empty_payloads_serialize_as_objects() {
        assert_eq!(
            serde_json::to_value(PauseAudio {}).expect("serialize"),
            json!({})
        );
        let ready: ModuleReady = serde_json::from_value(json!({})).expect("deserialize");
        assert_eq!(ready, ModuleReady {});
    }

    #[test]
    fn watchlist_is_a_bare_array() {
        let watchlist: InstrumentsSelected =
            serde_json::from_value(json!([{ "ticker": "AAA" }, { "ticker": "BBB", "exchange": "X" }]))
                .expect("deserialize");
        assert_eq!(watchlist.0.len(), 2);
        assert_eq!(watchlist.0[1].exchange.as_deref(), Some("X"));
    }
}
