//! # Shared Store - Durable Object Storage
//!
//! Abstract key/value object store used for store checkpoints, delta
//! segments and the external call cache.
//!
//! ## Adapters
//!
//! - [`InMemoryObjectStore`]: process-local map, for tests and dry runs
//! - [`LocalObjectStore`]: one file per object inside a directory
//!
//! Object names are flat (no `/`), which keeps listing by prefix a single
//! directory scan.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod errors;
pub mod ports;

pub use adapters::{open_store, InMemoryObjectStore, LocalObjectStore};
pub use errors::ObjectStoreError;
pub use ports::ObjectStore;
