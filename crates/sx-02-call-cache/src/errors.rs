use shared_store::ObjectStoreError;
use thiserror::Error;

/// Cache persistence failures.
///
/// A failed `load` leaves the cache empty, which is a valid degraded mode.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache artifact {artifact} unreadable")]
    Load {
        artifact: String,
        #[source]
        source: ObjectStoreError,
    },

    #[error("Cache artifact {artifact} is corrupted")]
    Corrupted {
        artifact: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cache artifact {artifact} covers blocks {found_start}-{found_end}, expected {start}-{end}")]
    RangeMismatch {
        artifact: String,
        start: u64,
        end: u64,
        found_start: u64,
        found_end: u64,
    },

    #[error("Cache artifact {artifact} could not be encoded")]
    Encode {
        artifact: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cache artifact {artifact} could not be written")]
    Save {
        artifact: String,
        #[source]
        source: ObjectStoreError,
    },

    #[error("Invalid cache range: start {start} > end {end}")]
    InvalidRange { start: u64, end: u64 },
}

/// Failures of an external call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("Call transport failed: {0}")]
    Transport(String),

    #[error("Call to {to} reverted: {reason}")]
    Reverted { to: String, reason: String },

    #[error("No call endpoint available for {request}")]
    Unavailable { request: String },
}
