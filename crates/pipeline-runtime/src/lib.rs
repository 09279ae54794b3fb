//! # Exchange Pipeline Runtime
//!
//! Wires the versioned stores, the call cache, the subscription hub and the
//! exchange extractors into one sequential block driver.
//!
//! ## Modular Structure
//!
//! - `config` - Typed configuration with defaults and validation
//! - `registry` - The four exchange stores, owned by the driver
//! - `driver` - Per-block state machine and the stop condition
//! - `source` - Block sources (newline-delimited JSON file, in-memory)
//! - `printer` - Consumer task logging `pairs` updates
//! - `offline` - Call client for runs without a node
//!
//! ## Run Sequence
//!
//! ```text
//! config ──→ stores + cache ──→ Pipeline::new (topics)
//!                                     │
//!            printer (subscribe) ─────┤
//!                                     ↓
//!                         prepare (load state, warm cache)
//!                                     │
//!          BlockSource::run ──→ handle_block × N ──→ EndOfStream
//!                                                   (checkpoints, cache
//!                                                    save, hub close)
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod driver;
pub mod errors;
pub mod offline;
pub mod printer;
pub mod registry;
pub mod source;

pub use config::{
    CacheConfig, ConfigError, ExchangeConfig, HubSettings, PipelineConfig, RunConfig,
    StorageConfig,
};
pub use driver::{DriverState, HandlerOutcome, Pipeline};
pub use errors::{PipelineError, StepError};
pub use offline::OfflineCallClient;
pub use printer::spawn_pair_printer;
pub use registry::StoreRegistry;
pub use source::{
    BlockHandler, BlockSource, IterBlockSource, JsonlBlockSource, SourceError, StreamEnd,
};
