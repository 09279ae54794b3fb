//! # Pipeline Configuration
//!
//! Typed configuration sections with defaults. The binary fills them from the
//! command line and environment; tests build them directly.

use shared_bus::{HubConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_SEND_TIMEOUT_MS};
use shared_types::BlockNum;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub run: RunConfig,
    pub storage: StorageConfig,
    pub hub: HubSettings,
    pub cache: CacheConfig,
    pub exchange: ExchangeConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.block_count == 0 {
            return Err(ConfigError::ZeroBlockCount);
        }
        if self.run.start_block.checked_add(self.run.block_count).is_none() {
            return Err(ConfigError::RangeOverflow {
                start: self.run.start_block,
                count: self.run.block_count,
            });
        }
        if self.run.checkpoint_interval == Some(0) {
            return Err(ConfigError::ZeroCheckpointInterval);
        }
        if self.hub.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.cache.start > self.cache.end {
            return Err(ConfigError::InvalidCacheRange {
                start: self.cache.start,
                end: self.cache.end,
            });
        }
        if self.storage.state_store_url.trim().is_empty() {
            return Err(ConfigError::MissingUrl("state store"));
        }
        if self.storage.cache_store_url.trim().is_empty() {
            return Err(ConfigError::MissingUrl("cache store"));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Block count must be at least 1")]
    ZeroBlockCount,

    #[error("Start block {start} plus count {count} overflows")]
    RangeOverflow { start: BlockNum, count: u64 },

    #[error("Checkpoint interval must be at least 1 when set")]
    ZeroCheckpointInterval,

    #[error("Subscriber queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("Cache range start {start} is after end {end}")]
    InvalidCacheRange { start: BlockNum, end: BlockNum },

    #[error("Missing {0} URL")]
    MissingUrl(&'static str),

    #[error("Invalid cache range {0:?}: expected START-END")]
    MalformedCacheRange(String),
}

/// Which blocks to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// First block to process. Above genesis, state is loaded from storage.
    pub start_block: BlockNum,
    /// Number of blocks to process; block `start + count` terminates the run.
    pub block_count: u64,
    /// Write checkpoints every `n` processed blocks.
    pub checkpoint_interval: Option<u64>,
}

impl RunConfig {
    /// First block that is not processed.
    pub fn stop_block(&self) -> BlockNum {
        self.start_block.saturating_add(self.block_count)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_block: 0,
            block_count: 1000,
            checkpoint_interval: None,
        }
    }
}

/// Storage locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Newline-delimited JSON blocks.
    pub blocks_file: PathBuf,
    /// Checkpoints and delta segments.
    pub state_store_url: String,
    /// External call cache.
    pub cache_store_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            blocks_file: PathBuf::from("./blocks.jsonl"),
            state_store_url: "file://./localdata".to_string(),
            cache_store_url: "file://./rpc-cache".to_string(),
        }
    }
}

/// Subscription hub tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSettings {
    pub queue_capacity: usize,
    pub send_timeout_ms: u64,
}

impl HubSettings {
    pub fn to_hub_config(&self) -> HubConfig {
        HubConfig {
            queue_capacity: self.queue_capacity,
            send_timeout: Duration::from_millis(self.send_timeout_ms),
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_CHANNEL_CAPACITY,
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
        }
    }
}

/// External call cache window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub start: BlockNum,
    pub end: BlockNum,
}

impl CacheConfig {
    /// Parse `START-END`.
    pub fn parse_range(value: &str) -> Result<Self, ConfigError> {
        let malformed = || ConfigError::MalformedCacheRange(value.to_string());
        let (start, end) = value.split_once('-').ok_or_else(malformed)?;
        Ok(Self {
            start: start.trim().parse().map_err(|_| malformed())?,
            end: end.trim().parse().map_err(|_| malformed())?,
        })
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { start: 0, end: 999 }
    }
}

/// Exchange domain settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Only pairs created by this factory are tracked.
    pub factory: Option<String>,
    /// Node endpoint for external calls.
    pub rpc_endpoint: String,
    /// Log every `pair` delta from a dedicated subscriber.
    pub print_pairs: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            factory: None,
            rpc_endpoint: "http://localhost:8546".to_string(),
            print_pairs: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(PipelineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = PipelineConfig::default();
        config.run.block_count = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroBlockCount));

        let mut config = PipelineConfig::default();
        config.run.checkpoint_interval = Some(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroCheckpointInterval));

        let mut config = PipelineConfig::default();
        config.run.start_block = u64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RangeOverflow { .. })
        ));

        let mut config = PipelineConfig::default();
        config.cache = CacheConfig { start: 5, end: 4 };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCacheRange { .. })
        ));

        let mut config = PipelineConfig::default();
        config.storage.state_store_url = " ".into();
        assert_eq!(config.validate(), Err(ConfigError::MissingUrl("state store")));
    }

    #[test]
    fn test_parse_cache_range() {
        assert_eq!(
            CacheConfig::parse_range("1000-1999"),
            Ok(CacheConfig {
                start: 1000,
                end: 1999
            })
        );
        assert!(CacheConfig::parse_range("1000").is_err());
        assert!(CacheConfig::parse_range("a-b").is_err());
    }

    #[test]
    fn test_stop_block() {
        let run = RunConfig {
            start_block: 100,
            block_count: 5,
            checkpoint_interval: None,
        };
        assert_eq!(run.stop_block(), 105);
    }
}
