//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Counts bridge traffic per event name and drops per reason label.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{TelemetryError, TelemetryResult};

/// Prometheus-backed metrics registry shared across module instances.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    forwarded_total: IntCounterVec,
    received_total: IntCounterVec,
    dropped_total: IntCounterVec,
    post_failures_total: IntCounter,
    dispatch_failures_total: IntCounter,
    module_instances: IntGauge,
}

/// Snapshot of the bridge counters and gauges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Number of live module instances.
    pub module_instances: i64,
    /// Transport failures while posting to the peer window.
    pub post_failures_total: u64,
    /// Inbound messages whose local dispatch failed.
    pub dispatch_failures_total: u64,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Metrics")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl Metrics {
    /// Construct a new metrics registry with the bridge collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> TelemetryResult<Self> {
        let registry = Registry::new();

        let forwarded_total = counter_vec(
            "bridge_messages_forwarded_total",
            "Outbound bus messages posted to the peer window",
            "event",
        )?;
        let received_total = counter_vec(
            "bridge_messages_received_total",
            "Inbound window messages dispatched to the local bus",
            "event",
        )?;
        let dropped_total = counter_vec(
            "bridge_messages_dropped_total",
            "Inbound window messages ignored by the bridge",
            "reason",
        )?;
        let post_failures_total = counter(
            "bridge_post_failures_total",
            "Failures posting messages to the peer window",
        )?;
        let dispatch_failures_total = counter(
            "bridge_dispatch_failures_total",
            "Inbound messages whose local dispatch failed",
        )?;
        let module_instances = IntGauge::with_opts(Opts::new(
            "module_instances",
            "Module instances currently loaded",
        ))
        .map_err(|source| TelemetryError::Collector {
            metric: "module_instances",
            source,
        })?;

        register(&registry, "bridge_messages_forwarded_total", &forwarded_total)?;
        register(&registry, "bridge_messages_received_total", &received_total)?;
        register(&registry, "bridge_messages_dropped_total", &dropped_total)?;
        register(&registry, "bridge_post_failures_total", &post_failures_total)?;
        register(
            &registry,
            "bridge_dispatch_failures_total",
            &dispatch_failures_total,
        )?;
        register(&registry, "module_instances", &module_instances)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                forwarded_total,
                received_total,
                dropped_total,
                post_failures_total,
                dispatch_failures_total,
                module_instances,
            }),
        })
    }

    /// Increment the forwarded counter for the given event.
    pub fn inc_forwarded(&self, event: &str) {
        self.inner.forwarded_total.with_label_values(&[event]).inc();
    }

    /// Increment the received counter for the given event.
    pub fn inc_received(&self, event: &str) {
        self.inner.received_total.with_label_values(&[event]).inc();
    }

    /// Increment the dropped counter for the given reason label.
    pub fn inc_dropped(&self, reason: &str) {
        self.inner.dropped_total.with_label_values(&[reason]).inc();
    }

    /// Increment the peer post failure counter.
    pub fn inc_post_failure(&self) {
        self.inner.post_failures_total.inc();
    }

    /// Increment the inbound dispatch failure counter.
    pub fn inc_dispatch_failure(&self) {
        self.inner.dispatch_failures_total.inc();
    }

    /// Record a module instance being loaded.
    pub fn inc_module_instances(&self) {
        self.inner.module_instances.inc();
    }

    /// Record a module instance being unloaded.
    pub fn dec_module_instances(&self) {
        self.inner.module_instances.dec();
    }

    /// Forwarded message count for one event.
    #[must_use]
    pub fn forwarded(&self, event: &str) -> u64 {
        self.inner.forwarded_total.with_label_values(&[event]).get()
    }

    /// Received message count for one event.
    #[must_use]
    pub fn received(&self, event: &str) -> u64 {
        self.inner.received_total.with_label_values(&[event]).get()
    }

    /// Dropped message count for one reason label.
    #[must_use]
    pub fn dropped(&self, reason: &str) -> u64 {
        self.inner.dropped_total.with_label_values(&[reason]).get()
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Render { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::Utf8 { source })
    }

    /// Take a point-in-time snapshot of the unlabelled gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            module_instances: self.inner.module_instances.get(),
            post_failures_total: self.inner.post_failures_total.get(),
            dispatch_failures_total: self.inner.dispatch_failures_total.get(),
        }
    }
}

fn counter_vec(name: &'static str, help: &str, label: &str) -> TelemetryResult<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), &[label])
        .map_err(|source| TelemetryError::Collector { metric: name, source })
}

fn counter(name: &'static str, help: &str) -> TelemetryResult<IntCounter> {
    IntCounter::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::Collector { metric: name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> TelemetryResult<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::Register { metric: name, source })
}
