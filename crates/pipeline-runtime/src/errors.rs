use crate::driver::DriverState;
use shared_bus::HubError;
use shared_types::BlockNum;
use sx_01_state_store::{LoadError, PersistenceError, StoreError};
use sx_02_call_cache::CacheError;
use sx_03_exchange::{DecodeError, ExtractionError, StateBuildError};
use thiserror::Error;

/// Failure of one step of the per-block pipeline.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("store")]
    Store(#[from] StoreError),

    #[error("decode")]
    Decode(#[from] DecodeError),

    #[error("extraction")]
    Extraction(#[from] ExtractionError),

    #[error("state build")]
    StateBuild(#[from] StateBuildError),

    #[error("broadcast to topic {topic}")]
    Broadcast {
        topic: String,
        #[source]
        source: HubError,
    },

    #[error("persistence")]
    Persistence(#[from] PersistenceError),
}

impl StepError {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Store(_) => "store",
            StepError::Decode(_) => "decode",
            StepError::Extraction(_) => "extraction",
            StepError::StateBuild(_) => "state_build",
            StepError::Broadcast { .. } => "broadcast",
            StepError::Persistence(_) => "persistence",
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Block {block} aborted at {source}")]
    BlockAborted {
        block: BlockNum,
        #[source]
        source: StepError,
    },

    #[error("Registering topic {topic} failed")]
    Registration {
        topic: String,
        #[source]
        source: HubError,
    },

    #[error("Loading state failed")]
    Load(#[from] LoadError),

    #[error("Writing final checkpoint failed")]
    Checkpoint(#[source] PersistenceError),

    #[error("Saving call cache failed")]
    CacheSave(#[source] CacheError),

    #[error("Driver is {state:?}, block {block} refused")]
    NotRunning { state: DriverState, block: BlockNum },

    #[error("Block {block} is before start block {start}")]
    BeforeStart { block: BlockNum, start: BlockNum },

    #[error("Block {block} does not follow block {last}")]
    OutOfOrder { block: BlockNum, last: BlockNum },
}

impl PipelineError {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::BlockAborted { source, .. } => source.kind(),
            PipelineError::Registration { .. } => "registration",
            PipelineError::Load(_) => "load",
            PipelineError::Checkpoint(_) => "checkpoint",
            PipelineError::CacheSave(_) => "cache_save",
            PipelineError::NotRunning { .. } => "not_running",
            PipelineError::BeforeStart { .. } | PipelineError::OutOfOrder { .. } => "ordering",
        }
    }
}
