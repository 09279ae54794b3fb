//! Prometheus metrics for the pipeline.
//!
//! All metrics follow the naming convention: `sx_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DRIVER METRICS
    // =========================================================================

    /// Blocks fully processed (committed and flushed)
    pub static ref BLOCKS_PROCESSED: Counter = Counter::new(
        "sx_driver_blocks_processed_total",
        "Total number of blocks fully processed"
    ).expect("metric creation failed");

    /// Per-block processing duration
    pub static ref BLOCK_PROCESSING_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "sx_driver_block_duration_seconds",
            "Time spent processing one block"
        ).buckets(exponential_buckets(0.0001, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");

    /// Height of the last processed block
    pub static ref CURRENT_BLOCK: Gauge = Gauge::new(
        "sx_driver_current_block",
        "Height of the last processed block"
    ).expect("metric creation failed");

    /// Aborted blocks by error kind
    pub static ref PIPELINE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("sx_driver_errors_total", "Aborted blocks by error kind"),
        &["kind"]  // kind: decode/extraction/state_build/broadcast/persistence/...
    ).expect("metric creation failed");

    // =========================================================================
    // STORE METRICS
    // =========================================================================

    /// Deltas recorded by stores
    pub static ref DELTAS_RECORDED: CounterVec = CounterVec::new(
        Opts::new("sx_store_deltas_recorded_total", "Deltas recorded per store"),
        &["store", "operation"]  // operation: create/update/delete
    ).expect("metric creation failed");

    /// Checkpoints written
    pub static ref CHECKPOINTS_WRITTEN: CounterVec = CounterVec::new(
        Opts::new("sx_store_checkpoints_written_total", "Checkpoints written per store"),
        &["store"]
    ).expect("metric creation failed");

    // =========================================================================
    // HUB METRICS
    // =========================================================================

    /// Deltas broadcast per topic
    pub static ref DELTAS_BROADCAST: CounterVec = CounterVec::new(
        Opts::new("sx_hub_deltas_broadcast_total", "Deltas broadcast per topic"),
        &["topic"]
    ).expect("metric creation failed");

    // =========================================================================
    // CALL CACHE METRICS
    // =========================================================================

    /// Cache lookups by outcome
    pub static ref CALL_CACHE_LOOKUPS: CounterVec = CounterVec::new(
        Opts::new("sx_cache_lookups_total", "External call cache lookups"),
        &["outcome"]  // outcome: hit/miss
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling it again is a no-op.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Driver
        Box::new(BLOCKS_PROCESSED.clone()),
        Box::new(BLOCK_PROCESSING_DURATION.clone()),
        Box::new(CURRENT_BLOCK.clone()),
        Box::new(PIPELINE_ERRORS.clone()),
        // Stores
        Box::new(DELTAS_RECORDED.clone()),
        Box::new(CHECKPOINTS_WRITTEN.clone()),
        // Hub
        Box::new(DELTAS_BROADCAST.clone()),
        // Cache
        Box::new(CALL_CACHE_LOOKUPS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_encode_contains_registered_metrics() {
        register_metrics().unwrap();
        DELTAS_RECORDED.with_label_values(&["pairs", "create"]).inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("sx_store_deltas_recorded_total"));
    }

    #[test]
    fn test_gauge_set() {
        CURRENT_BLOCK.set(42.0);
        assert_eq!(CURRENT_BLOCK.get(), 42.0);
    }

    #[test]
    fn test_histogram_timer() {
        let before = BLOCK_PROCESSING_DURATION.get_sample_count();
        {
            let _timer = crate::time_histogram!(BLOCK_PROCESSING_DURATION);
        }
        assert_eq!(BLOCK_PROCESSING_DURATION.get_sample_count(), before + 1);
    }
}
