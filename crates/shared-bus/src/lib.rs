//! # Shared Bus - Subscription Hub for Store Deltas
//!
//! In-process, topic based publish/subscribe. There is one topic per store
//! name; the pipeline driver broadcasts each store's deltas to its topic once
//! per block.
//!
//! ```text
//! ┌──────────────┐  broadcast_deltas("pairs")   ┌──────────────┐
//! │    Driver    │ ───────────┐                 │  Subscriber  │
//! └──────────────┘            ▼                 │  (own task)  │
//!                    ┌──────────────────┐ next()└──────────────┘
//!                    │ SubscriptionHub  │ ──────────────↑
//!                    └──────────────────┘
//! ```
//!
//! ## Delivery guarantees
//!
//! - Every subscriber owns a bounded FIFO queue: deltas arrive in broadcast
//!   order and each at most once.
//! - Subscribing never replays earlier deltas.
//! - **Backpressure:** a broadcast waits for queue space up to
//!   [`HubConfig::send_timeout`], then fails with
//!   [`HubError::SubscriberOverflow`]. Deltas are never dropped silently.
//! - Closing the hub lets subscribers drain what is already queued; after
//!   that `next()` returns [`HubError::Closed`].

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod errors;
pub mod publisher;
pub mod subscriber;

pub use errors::HubError;
pub use publisher::{HubConfig, HubStats, SubscriptionHub};
pub use subscriber::{Subscriber, SubscriberId};

/// Maximum deltas buffered per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// How long a broadcast waits on a full subscriber queue, in milliseconds.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 5_000;
