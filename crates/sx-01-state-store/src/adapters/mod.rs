//! Artifact encoding for checkpoints and delta segments.

pub mod codec;
