//! # Substream Exchange Test Suite
//!
//! Cross-crate tests that drive the full pipeline: block source, driver,
//! stores, hub, call cache and object storage together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs       # Scripted chain, call client, pipeline harness
//!     ├── determinism.rs    # Same blocks, same state; delta replay
//!     ├── resume.rs         # Checkpoint + segment resume vs. from-genesis
//!     ├── subscriptions.rs  # Hub delivery through the driver
//!     └── persistence.rs    # Checkpoint idempotence, call cache round trip
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sx-tests
//! cargo test -p sx-tests integration::resume::
//! ```

#[cfg(test)]
mod integration;
