//! # Shared Types Crate
//!
//! Types exchanged between the block source, the versioned stores and the
//! subscription hub.
//!
//! ## Design Principles
//!
//! - **Blocks are opaque**: the payload is only decoded by extractors.
//! - **Deltas are the unit of truth**: every store mutation is a [`Delta`],
//!   and deltas are what gets persisted and broadcast.

pub mod block;
pub mod delta;
pub mod errors;

pub use block::{Block, BlockNum, BlockRef};
pub use delta::{Delta, Operation};
pub use errors::*;
