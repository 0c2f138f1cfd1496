//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters the synchronization workflow cares about.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    records_listed: IntGauge,
    files_copied_total: IntCounter,
    bytes_copied_total: IntCounter,
    copy_failures_total: IntCounterVec,
    deletions_total: IntCounterVec,
}

/// Snapshot of selected gauges and counters.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Records returned by the latest enumeration.
    pub records_listed: i64,
    /// Files copied into private storage.
    pub files_copied_total: u64,
    /// Bytes copied into private storage.
    pub bytes_copied_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let records_listed = IntGauge::with_opts(Opts::new(
            "records_listed",
            "Video records returned by the latest enumeration",
        ))
        .map_err(|source| collector("records_listed", source))?;
        let files_copied_total = IntCounter::with_opts(Opts::new(
            "files_copied_total",
            "Files copied into private storage",
        ))
        .map_err(|source| collector("files_copied_total", source))?;
        let bytes_copied_total = IntCounter::with_opts(Opts::new(
            "bytes_copied_total",
            "Bytes copied into private storage",
        ))
        .map_err(|source| collector("bytes_copied_total", source))?;
        let copy_failures_total = IntCounterVec::new(
            Opts::new("copy_failures_total", "Copy failures by stage"),
            &["stage"],
        )
        .map_err(|source| collector("copy_failures_total", source))?;
        let deletions_total = IntCounterVec::new(
            Opts::new("deletions_total", "Deletion attempts by terminal outcome"),
            &["outcome"],
        )
        .map_err(|source| collector("deletions_total", source))?;

        register(&registry, "records_listed", records_listed.clone())?;
        register(&registry, "files_copied_total", files_copied_total.clone())?;
        register(&registry, "bytes_copied_total", bytes_copied_total.clone())?;
        register(&registry, "copy_failures_total", copy_failures_total.clone())?;
        register(&registry, "deletions_total", deletions_total.clone())?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                records_listed,
                files_copied_total,
                bytes_copied_total,
                copy_failures_total,
                deletions_total,
            }),
        })
    }

    /// Record the size of the latest enumeration.
    pub fn set_records_listed(&self, count: usize) {
        self.inner
            .records_listed
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Record a completed copy of `bytes` bytes.
    pub fn inc_file_copied(&self, bytes: u64) {
        self.inner.files_copied_total.inc();
        self.inner.bytes_copied_total.inc_by(bytes);
    }

    /// Record a failed copy at `stage`.
    pub fn inc_copy_failure(&self, stage: &str) {
        self.inner
            .copy_failures_total
            .with_label_values(&[stage])
            .inc();
    }

    /// Record a deletion attempt ending in `outcome`.
    pub fn inc_deletion(&self, outcome: &str) {
        self.inner
            .deletions_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Failures recorded for `stage`.
    #[must_use]
    pub fn copy_failures(&self, stage: &str) -> u64 {
        self.inner
            .copy_failures_total
            .with_label_values(&[stage])
            .get()
    }

    /// Deletion attempts recorded for `outcome`.
    #[must_use]
    pub fn deletions(&self, outcome: &str) -> u64 {
        self.inner
            .deletions_total
            .with_label_values(&[outcome])
            .get()
    }

    /// Capture the headline gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_listed: self.inner.records_listed.get(),
            files_copied_total: self.inner.files_copied_total.get(),
            bytes_copied_total: self.inner.bytes_copied_total.get(),
        }
    }

    /// Render all collectors in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the output is not UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.inner.registry.gather(), &mut buffer)
            .map_err(|source| TelemetryError::MetricsRender { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }
}

const fn collector(name: &'static str, source: prometheus::Error) -> TelemetryError {
    TelemetryError::metric("build", name, source)
}

fn register<C>(registry: &Registry, name: &'static str, collector: C) -> Result<()>
where
    C: prometheus::core::Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::metric("register", name, source))
}
