//! # sx-02-call-cache
//!
//! Memoizes read-only external calls (contract reads against a node) keyed by
//! their canonical request, so replays of the same block range never go back
//! to the node.
//!
//! ## Cache Epoch
//!
//! A cache covers a validity window of block heights `[start, end]`. Entries
//! are write-once within the window and never evicted. The whole window is
//! loaded from and saved to one object:
//!
//! ```text
//! cache-{start:010}-{end:010}.json
//! ```
//!
//! ## Components
//!
//! - [`CallCache`]: in-memory entries plus bulk `load`/`save`
//! - [`CallClient`]: port to the node transport
//! - [`CachedCaller`]: serves from the cache inside the window, calls
//!   through (without caching) outside it

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod cache;
pub mod caller;
pub mod errors;
pub mod ports;
pub mod request;

pub use cache::{CacheStats, CallCache};
pub use caller::CachedCaller;
pub use errors::{CacheError, CallError};
pub use ports::CallClient;
pub use request::{CallKey, CallRequest};
