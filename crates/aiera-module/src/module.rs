//! The module entry point: one explicitly constructed instance per embedding.
//!
//! # Design
//! - `AieraModule` owns the bus and its window bridge; dropping or unloading it
//!   tears down window messaging and clears every listener.
//! - Host helpers are thin wrappers that emit catalog events outward.
//! - Diagnostics are opt-in through `ModuleConfig::diagnostics`.

use std::rc::Rc;

use aiera_bridge::{BridgeState, MessageSource, PeerWindow, WindowBridge};
use aiera_config::ModuleConfig;
use aiera_events::{
    Authenticate, Configure, Direction, EventBusResult, EventRegistry, Instrument,
    InstrumentSelected, InstrumentsSelected, Listener, MessageBus, ModuleReady, RegistryEvent,
    Subscription, TypedMessage, bind,
};
#[cfg(not(target_arch = "wasm32"))]
use aiera_telemetry::Metrics;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::diagnostics::Diagnostics;
use crate::error::{ModuleError, ModuleResult};

/// A loaded module: message bus plus its bridge to the peer window.
pub struct AieraModule {
    id: Uuid,
    config: ModuleConfig,
    bus: MessageBus,
    bridge: WindowBridge,
    #[cfg(not(target_arch = "wasm32"))]
    metrics: Option<Metrics>,
}

impl AieraModule {
    /// Build the bus and bridge it to `peer`, receiving from `source`.
    ///
    /// On native targets a private metrics registry is created when
    /// diagnostics are enabled; use [`AieraModule::load_with_metrics`] to share
    /// one across instances.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Telemetry`] when the metrics registry cannot be
    /// created.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(
        config: ModuleConfig,
        peer: Rc<dyn PeerWindow>,
        source: Rc<dyn MessageSource>,
    ) -> ModuleResult<Self> {
        let metrics = if config.diagnostics {
            Some(Metrics::new().map_err(|err| ModuleError::telemetry("module.load", err))?)
        } else {
            None
        };
        Ok(Self::assemble(config, peer, source, metrics))
    }

    /// Build the bus and bridge it to `peer`, receiving from `source`.
    ///
    /// # Errors
    ///
    /// Loading in the browser does not fail once configuration is valid; the
    /// result mirrors the native signature.
    #[cfg(target_arch = "wasm32")]
    pub fn load(
        config: ModuleConfig,
        peer: Rc<dyn PeerWindow>,
        source: Rc<dyn MessageSource>,
    ) -> ModuleResult<Self> {
        Ok(Self::assemble(config, peer, source))
    }

    /// Load with a shared metrics registry. Diagnostics are counted in
    /// `metrics` when enabled and the `module_instances` gauge tracks the
    /// instance either way.
    #[cfg(not(target_arch = "wasm32"))]
    #[must_use]
    pub fn load_with_metrics(
        config: ModuleConfig,
        peer: Rc<dyn PeerWindow>,
        source: Rc<dyn MessageSource>,
        metrics: Metrics,
    ) -> Self {
        Self::assemble(config, peer, source, Some(metrics))
    }

    /// Load with configuration read from `AIERA_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Config`] when a variable holds an invalid value,
    /// otherwise the errors of [`AieraModule::load`].
    pub fn from_env(peer: Rc<dyn PeerWindow>, source: Rc<dyn MessageSource>) -> ModuleResult<Self> {
        let config =
            ModuleConfig::from_env().map_err(|err| ModuleError::config("module.from_env", err))?;
        Self::load(config, peer, source)
    }

    fn assemble(
        config: ModuleConfig,
        peer: Rc<dyn PeerWindow>,
        source: Rc<dyn MessageSource>,
        #[cfg(not(target_arch = "wasm32"))] metrics: Option<Metrics>,
    ) -> Self {
        let id = Uuid::new_v4();
        let bus = MessageBus::with_registry(EventRegistry::standard(), config.validation);
        let mut bridge = WindowBridge::new(bus.clone(), source);
        if config.diagnostics {
            let diagnostics = Diagnostics::new(id);
            #[cfg(not(target_arch = "wasm32"))]
            let diagnostics = diagnostics.with_metrics(metrics.clone());
            bridge = bridge.with_observer(Rc::new(diagnostics));
        }
        bridge.setup_window_messaging(peer, config.origin_filter());

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(metrics) = &metrics {
            metrics.inc_module_instances();
        }
        info!(
            module_id = %id,
            target_origin = config.origin_filter().unwrap_or(aiera_bridge::ANY_ORIGIN),
            validation = ?config.validation,
            diagnostics = config.diagnostics,
            "module loaded"
        );

        Self {
            id,
            config,
            bus,
            bridge,
            #[cfg(not(target_arch = "wasm32"))]
            metrics,
        }
    }

    /// Identifier of this instance, attached to its log events.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Configuration the module was loaded with.
    #[must_use]
    pub const fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// The module's bus. Clones share listeners with the module.
    #[must_use]
    pub const fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Whether window messaging is currently set up.
    #[must_use]
    pub fn bridge_state(&self) -> BridgeState {
        self.bridge.state()
    }

    /// Register `listener` for `event` in `direction`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown events under strict validation.
    pub fn on(&self, event: &str, listener: &Listener, direction: Direction) -> EventBusResult<()> {
        self.bus.on(event, listener, direction)
    }

    /// Remove one registration of `listener`. Returns `false` when none existed.
    pub fn off(&self, event: &str, listener: &Listener, direction: Direction) -> bool {
        self.bus.off(event, listener, direction)
    }

    /// Emit `event`; `out` events also cross to the peer window.
    ///
    /// # Errors
    ///
    /// Returns validation errors under strict mode and the first listener
    /// failure.
    pub fn emit(&self, event: &str, data: Value, direction: Direction) -> EventBusResult<usize> {
        self.bus.emit(event, data, direction)
    }

    /// Register a typed listener and return its handle for later removal.
    ///
    /// # Errors
    ///
    /// See [`MessageBus::on_event`].
    pub fn on_event<E, F>(&self, direction: Direction, callback: F) -> EventBusResult<Listener>
    where
        E: RegistryEvent,
        F: Fn(TypedMessage<E>) + 'static,
    {
        self.bus.on_event::<E, F>(direction, callback)
    }

    /// Bind `listener` and return a guard that removes it on drop.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown events under strict validation.
    pub fn subscribe(
        &self,
        event: &str,
        listener: Listener,
        direction: Direction,
    ) -> EventBusResult<Subscription> {
        bind(&self.bus, event, listener, direction)
    }

    /// Remove every listener on the bus. Window messaging keeps running.
    pub fn remove_all_listeners(&self) {
        self.bus.remove_all_listeners();
    }

    /// Re-bridge the bus to another peer, replacing the current binding.
    pub fn setup_window_messaging(&self, peer: Rc<dyn PeerWindow>, origin_filter: Option<&str>) {
        self.bridge.setup_window_messaging(peer, origin_filter);
    }

    /// Tear down window messaging. Returns `false` when it was not set up.
    pub fn cleanup_window_messaging(&self) -> bool {
        self.bridge.cleanup_window_messaging()
    }

    /// Send credentials to the peer (`authenticate`, outbound).
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::EventBus`] when the emit fails.
    pub fn authenticate(
        &self,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> ModuleResult<usize> {
        let payload = Authenticate {
            access_token: access_token.into(),
            refresh_token,
        };
        self.emit_out(&payload, "module.authenticate")
    }

    /// Send display options to the peer (`configure`, outbound).
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::EventBus`] when the emit fails.
    pub fn configure(&self, options: &Configure) -> ModuleResult<usize> {
        self.emit_out(options, "module.configure")
    }

    /// Replace the peer's watchlist (`instruments-selected`, outbound).
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::EventBus`] when the emit fails.
    pub fn set_watchlist(&self, instruments: Vec<Instrument>) -> ModuleResult<usize> {
        self.emit_out(&InstrumentsSelected(instruments), "module.set_watchlist")
    }

    /// Select one instrument in the peer (`instrument-selected`, outbound).
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::EventBus`] when the emit fails.
    pub fn select_instrument(&self, instrument: Instrument) -> ModuleResult<usize> {
        self.emit_out(&InstrumentSelected(instrument), "module.select_instrument")
    }

    /// Tell the host the frame is ready (`module-ready`, outbound).
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::EventBus`] when the emit fails.
    pub fn announce_ready(&self) -> ModuleResult<usize> {
        self.emit_out(&ModuleReady {}, "module.announce_ready")
    }

    /// Tear the module down: window messaging first, then every listener.
    pub fn unload(self) {
        drop(self);
    }

    fn emit_out<E: RegistryEvent>(&self, payload: &E, operation: &'static str) -> ModuleResult<usize> {
        self.bus
            .emit_event(payload, Direction::Out)
            .map_err(|err| ModuleError::event_bus(operation, err))
    }
}

impl Drop for AieraModule {
    fn drop(&mut self) {
        let bridged = self.bridge.cleanup_window_messaging();
        self.bus.remove_all_listeners();
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(metrics) = &self.metrics {
            metrics.dec_module_instances();
        }
        info!(module_id = %self.id, bridged, "module unloaded");
    }
}

impl std::fmt::Debug for AieraModule {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AieraModule")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("bridge", &self.bridge.state())
            .finish_non_exhaustive()
    }
}
