//! # Error Types
//!
//! Errors about the shape of shared values.

use thiserror::Error;

/// A delta whose fields contradict its operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeltaError {
    /// A create carried a previous value.
    #[error("create delta for key {key} carries an old value")]
    CreateWithOldValue { key: String },

    /// A create, update or delete is missing a value it requires.
    #[error("{operation} delta for key {key} is missing its {field} value")]
    MissingValue {
        key: String,
        operation: &'static str,
        field: &'static str,
    },

    /// A delete carried a new value.
    #[error("delete delta for key {key} carries a new value")]
    DeleteWithNewValue { key: String },
}
