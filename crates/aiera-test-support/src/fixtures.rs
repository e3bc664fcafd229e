//! Test fixtures: origins, sample payloads, and raw wire envelopes.

use aiera_bridge::NAMESPACE;
use aiera_events::{Authenticate, Instrument, InstrumentSelected, SeekAudioSeconds};
use anyhow::{Context, Result};
use serde_json::{Value, json};
use url::Url;

/// Origin used for the host page in tests.
pub const HOST_ORIGIN: &str = "https://host.example.com";
/// Origin used for the embedded module frame in tests.
pub const MODULE_ORIGIN: &str = "https://module.example.com";
/// Origin that no test configures as trusted.
pub const ROGUE_ORIGIN: &str = "https://rogue.example.net";

/// Serialized origin of an arbitrary URL, as a browser would report it.
///
/// # Errors
///
/// Returns an error when `raw` is not an absolute URL.
pub fn origin_of(raw: &str) -> Result<String> {
    let url = Url::parse(raw).with_context(|| format!("invalid fixture url '{raw}'"))?;
    Ok(url.origin().ascii_serialization())
}

/// Sample `authenticate` payload.
#[must_use]
pub fn authenticate() -> Authenticate {
    Authenticate {
        access_token: "access-token-fixture".to_string(),
        refresh_token: Some("refresh-token-fixture".to_string()),
    }
}

/// Sample instrument.
#[must_use]
pub fn instrument() -> Instrument {
    Instrument {
        ticker: "AAPL".to_string(),
        exchange: Some("NASDAQ".to_string()),
        name: Some("Apple Inc.".to_string()),
    }
}

/// Sample `instrument-selected` payload.
#[must_use]
pub fn instrument_selected() -> InstrumentSelected {
    InstrumentSelected(instrument())
}

/// Sample watchlist for `instruments-selected`.
#[must_use]
pub fn watchlist() -> Vec<Instrument> {
    vec![
        instrument(),
        Instrument::ticker("MSFT"),
        Instrument {
            ticker: "TSLA".to_string(),
            exchange: Some("NASDAQ".to_string()),
            name: None,
        },
    ]
}

/// Sample `seek-audio-seconds` payload.
#[must_use]
pub const fn seek(seconds: f64) -> SeekAudioSeconds {
    SeekAudioSeconds { seconds }
}

/// Module-namespaced envelope as it would arrive from a peer window.
#[must_use]
pub fn envelope(event: &str, data: Value) -> Value {
    json!({ "ns": NAMESPACE, "event": event, "data": data })
}

/// Envelope carrying another protocol's namespace tag.
#[must_use]
pub fn foreign_envelope(event: &str, data: Value) -> Value {
    json!({ "ns": "react-devtools", "event": event, "data": data })
}
