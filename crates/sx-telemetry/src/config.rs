//! Telemetry configuration from environment variables.

use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name, logged at startup
    pub service_name: String,

    /// Log level filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive)
    pub log_level: String,

    /// JSON formatted log lines
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "sx-pipeline".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `SX_SERVICE_NAME`: Service name (default: sx-pipeline)
    /// - `SX_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `SX_JSON_LOGS`: JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("SX_SERVICE_NAME")
                .unwrap_or_else(|_| "sx-pipeline".to_string()),

            log_level: env::var("SX_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("SX_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
