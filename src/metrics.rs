//! Pipeline metrics
//!
//! Derivation, assembly, submission and correlation counters on a private
//! Prometheus registry, exported in the text format.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub addresses_derived: IntCounter,
    pub transactions_assembled: IntCounter,
    pub submissions_accepted: IntCounter,
    pub submissions_failed: IntCounterVec,
    pub submissions_stale: IntCounter,
    pub correlations_recovered: IntCounter,
    pub correlations_missed: IntCounter,

    // Histograms
    pub derive_bump_iterations: Histogram,
    pub submit_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let addresses_derived = IntCounter::with_opts(Opts::new(
            "addresses_derived_total",
            "Number of program-derived addresses found",
        ))?;

        let transactions_assembled = IntCounter::with_opts(Opts::new(
            "transactions_assembled_total",
            "Number of transactions assembled and signed",
        ))?;

        let submissions_accepted = IntCounter::with_opts(Opts::new(
            "submissions_accepted_total",
            "Number of submissions accepted by the network boundary",
        ))?;

        let submissions_failed = IntCounterVec::new(
            Opts::new(
                "submissions_failed_total",
                "Number of submissions that failed, by failure kind",
            ),
            &["kind"],
        )?;

        let submissions_stale = IntCounter::with_opts(Opts::new(
            "submissions_stale_total",
            "Number of submissions refused locally for a stale freshness token",
        ))?;

        let correlations_recovered = IntCounter::with_opts(Opts::new(
            "correlations_recovered_total",
            "Number of failures for which a correlation id was found",
        ))?;

        let correlations_missed = IntCounter::with_opts(Opts::new(
            "correlations_missed_total",
            "Number of failures with no recoverable correlation id",
        ))?;

        let derive_bump_iterations = Histogram::with_opts(
            HistogramOpts::new(
                "derive_bump_iterations",
                "Bump candidates tried before an off-curve locator was found",
            )
            .buckets(vec![1.0, 2.0, 3.0, 4.0, 8.0, 16.0]),
        )?;

        let submit_latency = Histogram::with_opts(
            HistogramOpts::new("submit_latency_seconds", "Network submission latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(addresses_derived.clone()))?;
        registry.register(Box::new(transactions_assembled.clone()))?;
        registry.register(Box::new(submissions_accepted.clone()))?;
        registry.register(Box::new(submissions_failed.clone()))?;
        registry.register(Box::new(submissions_stale.clone()))?;
        registry.register(Box::new(correlations_recovered.clone()))?;
        registry.register(Box::new(correlations_missed.clone()))?;
        registry.register(Box::new(derive_bump_iterations.clone()))?;
        registry.register(Box::new(submit_latency.clone()))?;

        Ok(Self {
            registry,
            addresses_derived,
            transactions_assembled,
            submissions_accepted,
            submissions_failed,
            submissions_stale,
            correlations_recovered,
            correlations_missed,
            derive_bump_iterations,
            submit_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every registered metric in the Prometheus text format
    pub fn export_text(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_contains_registered_names() {
        let m = Metrics::new().unwrap();
        m.transactions_assembled.inc();
        m.submissions_failed.with_label_values(&["rejection"]).inc();
        m.submit_latency.observe(0.02);

        let text = m.export_text().unwrap();
        assert!(text.contains("transactions_assembled_total 1"));
        assert!(text.contains("submissions_failed_total{kind=\"rejection\"} 1"));
        assert!(text.contains("submit_latency_seconds_count 1"));
    }

    #[test]
    fn test_timer_observes() {
        let m = Metrics::new().unwrap();
        let timer = Timer::new();
        timer.observe_duration(&m.submit_latency);
        assert_eq!(m.submit_latency.get_sample_count(), 1);
    }
}
