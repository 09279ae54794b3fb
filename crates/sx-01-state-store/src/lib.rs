//! # sx-01-state-store
//!
//! Versioned State Store for the exchange pipeline.
//!
//! ## Role in System
//!
//! - **Single Writer**: each store is mutated only by its owning state-builder
//! - **Delta Recording**: every `set`/`delete` appends a [`Delta`] to the
//!   current block's buffer
//! - **Durability**: checkpoints and per-block delta segments go to an
//!   [`ObjectStore`]
//!
//! ## Block Lifecycle
//!
//! ```text
//! begin_block(n) → set/delete... → deltas() → store_block() → flush()
//!                                      │
//!                          (on failure) └─→ rollback_block()
//! ```
//!
//! ## Resume
//!
//! A checkpoint tagged `H` holds the state with every block `< H` applied.
//! [`Store::init`] loads the highest checkpoint at or below the target and
//! replays the delta segments between the two.
//!
//! [`Delta`]: shared_types::Delta
//! [`ObjectStore`]: shared_store::ObjectStore

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::codec::{CheckpointFile, CodecError, DeltaSegment, ProgressMarker};
pub use domain::errors::{LoadError, PersistenceError, StoreError};
pub use domain::names::{checkpoint_name, progress_name, segment_name, validate_store_name};
pub use domain::store::Store;
pub use ports::StoreReader;
