//! Event registry: the catalog of event names and their payload shapes.
//!
//! # Design
//! - The compile-time mapping lives on [`RegistryEvent`]; this module is the runtime view.
//! - A registry is frozen once built. Duplicate names fail the build.
//! - Validation is advisory unless the bus runs in [`EventValidation::Strict`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EventBusError, EventBusResult, RegistryError, RegistryResult};
use crate::payloads::{
    Authenticate, Authenticated, Configure, EventSelected, InstrumentSelected,
    InstrumentsSelected, ModuleReady, PauseAudio, PlayAudio, RegistryEvent, SeekAudioSeconds,
};

type PayloadCheck = fn(&Value) -> Result<(), serde_json::Error>;

fn check_payload<E: RegistryEvent>(data: &Value) -> Result<(), serde_json::Error> {
    E::deserialize(data).map(|_| ())
}

/// How strictly the bus enforces the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventValidation {
    /// Reject unknown event names and mismatched payloads.
    Strict,
    /// Accept any event name and payload.
    Lenient,
}

impl EventValidation {
    /// Strict in debug builds, lenient in release builds so host and module
    /// versions can drift without breaking production traffic.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Strict
        } else {
            Self::Lenient
        }
    }

    /// Parse a configuration value (`strict` / `lenient`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "lenient" => Some(Self::Lenient),
            _ => None,
        }
    }
}

impl Default for EventValidation {
    fn default() -> Self {
        Self::infer()
    }
}

/// Registry entry describing one event.
#[derive(Clone, Copy)]
pub struct RegisteredEvent {
    name: &'static str,
    payload_type: &'static str,
    check: PayloadCheck,
}

impl RegisteredEvent {
    /// Entry for a payload type.
    #[must_use]
    pub fn of<E: RegistryEvent>() -> Self {
        Self {
            name: E::NAME,
            payload_type: std::any::type_name::<E>(),
            check: check_payload::<E>,
        }
    }

    /// Event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Rust type name of the payload, for diagnostics.
    #[must_use]
    pub const fn payload_type(&self) -> &'static str {
        self.payload_type
    }

    /// Check a JSON payload against the registered shape.
    ///
    /// # Errors
    ///
    /// Returns the decoding error when the payload does not fit.
    pub fn validate(&self, data: &Value) -> Result<(), serde_json::Error> {
        (self.check)(data)
    }
}

impl fmt::Debug for RegisteredEvent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RegisteredEvent")
            .field("name", &self.name)
            .field("payload_type", &self.payload_type)
            .finish()
    }
}

/// Immutable event catalog shared by buses.
#[derive(Clone, Debug)]
pub struct EventRegistry {
    entries: Arc<BTreeMap<&'static str, RegisteredEvent>>,
}

impl EventRegistry {
    /// Start defining a registry.
    #[must_use]
    pub fn builder() -> EventRegistryBuilder {
        EventRegistryBuilder::default()
    }

    /// Built-in catalog of module events.
    #[must_use]
    pub fn standard() -> Self {
        let entries = standard_entries()
            .into_iter()
            .map(|entry| (entry.name, entry))
            .collect();
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Look up an event by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredEvent> {
        self.entries.get(name)
    }

    /// Returns `true` when the name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Number of registered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ensure `name` is registered.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::UnknownEvent`] when it is not.
    pub fn require(&self, name: &str) -> EventBusResult<&RegisteredEvent> {
        self.get(name).ok_or_else(|| EventBusError::UnknownEvent {
            event: name.to_string(),
        })
    }

    /// Ensure `name` is registered and `data` matches its payload shape.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::UnknownEvent`] or [`EventBusError::InvalidPayload`].
    pub fn validate(&self, name: &str, data: &Value) -> EventBusResult<()> {
        self.require(name)?
            .validate(data)
            .map_err(|source| EventBusError::InvalidPayload {
                event: name.to_string(),
                source,
            })
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Builder that freezes into an [`EventRegistry`].
#[derive(Debug, Default)]
pub struct EventRegistryBuilder {
    entries: BTreeMap<&'static str, RegisteredEvent>,
    duplicate: Option<&'static str>,
}

impl EventRegistryBuilder {
    /// Register a payload type under its event name.
    #[must_use]
    pub fn register<E: RegistryEvent>(self) -> Self {
        self.entry(RegisteredEvent::of::<E>())
    }

    /// Register every event of the built-in catalog.
    #[must_use]
    pub fn with_standard_events(self) -> Self {
        standard_entries().into_iter().fold(self, Self::entry)
    }

    /// Freeze the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateEvent`] for the first name registered twice.
    pub fn build(self) -> RegistryResult<EventRegistry> {
        if let Some(event) = self.duplicate {
            return Err(RegistryError::DuplicateEvent { event });
        }
        Ok(EventRegistry {
            entries: Arc::new(self.entries),
        })
    }

    fn entry(mut self, entry: RegisteredEvent) -> Self {
        if self.entries.insert(entry.name, entry).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(entry.name);
        }
        self
    }
}

fn standard_entries() -> [RegisteredEvent; 10] {
    [
        RegisteredEvent::of::<Authenticate>(),
        RegisteredEvent::of::<Authenticated>(),
        RegisteredEvent::of::<Configure>(),
        RegisteredEvent::of::<InstrumentSelected>(),
        RegisteredEvent::of::<InstrumentsSelected>(),
        RegisteredEvent::of::<EventSelected>(),
        RegisteredEvent::of::<SeekAudioSeconds>(),
        RegisteredEvent::of::<PlayAudio>(),
        RegisteredEvent::of::<PauseAudio>(),
        RegisteredEvent::of::<ModuleReady>(),
    ]
}
