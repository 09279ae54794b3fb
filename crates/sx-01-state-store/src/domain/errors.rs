use crate::adapters::codec::CodecError;
use shared_store::ObjectStoreError;
use shared_types::{BlockNum, DeltaError};
use thiserror::Error;

/// In-memory store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid store name {name:?}: expected [a-z0-9_]+")]
    InvalidName { name: String },

    #[error("Store {store}: {pending} deltas of block {buffered_block} not flushed before block {block}")]
    UnflushedDeltas {
        store: String,
        pending: usize,
        buffered_block: BlockNum,
        block: BlockNum,
    },

    #[error("Store {store}: value at {key} is not a number")]
    NotANumber { store: String, key: String },

    #[error("Delta for store {found} applied to store {store}")]
    WrongStore { store: String, found: String },

    #[error("Store {store}: malformed delta")]
    InvalidDelta {
        store: String,
        #[source]
        source: DeltaError,
    },

    #[error("Store {store}: old value of {key} does not match current state at block {block}")]
    OldValueMismatch {
        store: String,
        key: String,
        block: BlockNum,
    },
}

/// Failures of [`Store::init`](crate::Store::init).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Store {store}: no checkpoint at or below block {target}")]
    NoCheckpoint { store: String, target: BlockNum },

    #[error("Store {store}: blocks below {target} were never processed (processed below {processed})")]
    NotProcessed {
        store: String,
        processed: BlockNum,
        target: BlockNum,
    },

    #[error("Store {store}: storage unreadable")]
    Storage {
        store: String,
        #[source]
        source: ObjectStoreError,
    },

    #[error("Store {store}: artifact {artifact} is corrupted")]
    Corrupted {
        store: String,
        artifact: String,
        #[source]
        source: CodecError,
    },

    #[error("Artifact {artifact} belongs to store {found}, expected {expected}")]
    WrongStore {
        artifact: String,
        expected: String,
        found: String,
    },

    #[error("Store {store}: replay of block {block} failed")]
    Replay {
        store: String,
        block: BlockNum,
        #[source]
        source: StoreError,
    },
}

/// Failures writing checkpoints or delta segments.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Store {store}: encoding {artifact} failed")]
    Encode {
        store: String,
        artifact: String,
        #[source]
        source: CodecError,
    },

    #[error("Store {store}: writing {artifact} failed")]
    Storage {
        store: String,
        artifact: String,
        #[source]
        source: ObjectStoreError,
    },
}
