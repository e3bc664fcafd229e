//! Bridge observer that logs traffic through `tracing` and, on native targets,
//! counts it in the shared metrics registry.

use aiera_bridge::{BridgeError, BridgeObserver, DropReason};
use aiera_events::EventBusError;
#[cfg(not(target_arch = "wasm32"))]
use aiera_telemetry::Metrics;
use tracing::{debug, warn};
use uuid::Uuid;

/// Diagnostics sink installed when `diagnostics` is enabled for a module.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    module_id: Uuid,
    #[cfg(not(target_arch = "wasm32"))]
    metrics: Option<Metrics>,
}

impl Diagnostics {
    /// Log-only diagnostics for one module instance.
    #[must_use]
    pub const fn new(module_id: Uuid) -> Self {
        Self {
            module_id,
            #[cfg(not(target_arch = "wasm32"))]
            metrics: None,
        }
    }

    /// Also count observations in `metrics`, when a registry is given.
    #[cfg(not(target_arch = "wasm32"))]
    #[must_use]
    pub fn with_metrics(mut self, metrics: Option<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Module instance the observations are attributed to.
    #[must_use]
    pub const fn module_id(&self) -> Uuid {
        self.module_id
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn count(&self, record: impl FnOnce(&Metrics)) {
        if let Some(metrics) = &self.metrics {
            record(metrics);
        }
    }
}

impl BridgeObserver for Diagnostics {
    fn forwarded(&self, event: &str) {
        debug!(module_id = %self.module_id, event, "bridge forwarded message");
        #[cfg(not(target_arch = "wasm32"))]
        self.count(|metrics| metrics.inc_forwarded(event));
    }

    fn received(&self, event: &str) {
        debug!(module_id = %self.module_id, event, "bridge received message");
        #[cfg(not(target_arch = "wasm32"))]
        self.count(|metrics| metrics.inc_received(event));
    }

    fn dropped(&self, reason: DropReason, origin: &str) {
        debug!(
            module_id = %self.module_id,
            reason = reason.as_str(),
            origin,
            "bridge dropped inbound message"
        );
        #[cfg(not(target_arch = "wasm32"))]
        self.count(|metrics| metrics.inc_dropped(reason.as_str()));
    }

    fn post_failed(&self, event: &str, error: &BridgeError) {
        warn!(module_id = %self.module_id, event, error = %error, "bridge failed to post message");
        #[cfg(not(target_arch = "wasm32"))]
        self.count(|metrics| metrics.inc_post_failure());
    }

    fn dispatch_failed(&self, event: &str, error: &EventBusError) {
        warn!(module_id = %self.module_id, event, error = %error, "inbound message dispatch failed");
        #[cfg(not(target_arch = "wasm32"))]
        self.count(|metrics| metrics.inc_dispatch_failure());
    }
}
