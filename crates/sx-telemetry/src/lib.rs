//! # Pipeline Telemetry
//!
//! Structured logging and Prometheus metrics for the exchange pipeline.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sx_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SX_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `SX_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `SX_SERVICE_NAME` | `sx-pipeline` | Service name in the startup log |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, BLOCKS_PROCESSED,
    BLOCK_PROCESSING_DURATION, CALL_CACHE_LOOKUPS, CHECKPOINTS_WRITTEN, CURRENT_BLOCK,
    DELTAS_BROADCAST, DELTAS_RECORDED, PIPELINE_ERRORS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics, then install the log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Start timing a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
