//! Cross-crate pipeline integration tests.

mod determinism;
mod fixtures;
mod persistence;
mod resume;
mod subscriptions;
