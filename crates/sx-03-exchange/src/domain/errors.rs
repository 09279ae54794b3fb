use shared_types::BlockNum;
use sx_01_state_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Block {block}: payload is not a valid exchange event list")]
    Payload {
        block: BlockNum,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Block {block}, event {index}: {reason}")]
    InvalidEvent {
        block: BlockNum,
        index: usize,
        reason: String,
    },

    #[error("Stored entity at {key} is corrupted")]
    CorruptEntity {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum StateBuildError {
    #[error("Block {block}: pair {pair} is not in the pairs store")]
    UnknownPair { pair: String, block: BlockNum },

    #[error("Encoding {key} failed")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
