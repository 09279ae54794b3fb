//! # Deltas
//!
//! A [`Delta`] is one observed single-key mutation of a store during one
//! block. Deltas are append-only within a block and are the unit of both
//! persistence and pub/sub distribution.
//!
//! Replaying the deltas of a block, in order, against the state before the
//! block reproduces the state after the block exactly.

use crate::block::BlockNum;
use crate::errors::DeltaError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

/// Kind of mutation recorded by a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded mutation of a store.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// Name of the store that was mutated.
    pub store: String,
    /// Mutated key.
    pub key: String,
    /// Kind of mutation.
    pub operation: Operation,
    /// Value before the mutation (`None` for creates).
    #[serde_as(as = "Option<Bytes>")]
    pub old_value: Option<Vec<u8>>,
    /// Value after the mutation (`None` for deletes).
    #[serde_as(as = "Option<Bytes>")]
    pub new_value: Option<Vec<u8>>,
    /// Height of the block that produced the mutation.
    pub block_number: BlockNum,
}

impl Delta {
    pub fn create(
        store: impl Into<String>,
        key: impl Into<String>,
        new_value: Vec<u8>,
        block_number: BlockNum,
    ) -> Self {
        Self {
            store: store.into(),
            key: key.into(),
            operation: Operation::Create,
            old_value: None,
            new_value: Some(new_value),
            block_number,
        }
    }

    pub fn update(
        store: impl Into<String>,
        key: impl Into<String>,
        old_value: Vec<u8>,
        new_value: Vec<u8>,
        block_number: BlockNum,
    ) -> Self {
        Self {
            store: store.into(),
            key: key.into(),
            operation: Operation::Update,
            old_value: Some(old_value),
            new_value: Some(new_value),
            block_number,
        }
    }

    pub fn delete(
        store: impl Into<String>,
        key: impl Into<String>,
        old_value: Vec<u8>,
        block_number: BlockNum,
    ) -> Self {
        Self {
            store: store.into(),
            key: key.into(),
            operation: Operation::Delete,
            old_value: Some(old_value),
            new_value: None,
            block_number,
        }
    }

    /// Check that the value fields agree with the operation.
    pub fn validate(&self) -> Result<(), DeltaError> {
        let missing = |field: &'static str| DeltaError::MissingValue {
            key: self.key.clone(),
            operation: self.operation.as_str(),
            field,
        };

        match self.operation {
            Operation::Create => {
                if self.old_value.is_some() {
                    return Err(DeltaError::CreateWithOldValue {
                        key: self.key.clone(),
                    });
                }
                if self.new_value.is_none() {
                    return Err(missing("new"));
                }
            }
            Operation::Update => {
                if self.old_value.is_none() {
                    return Err(missing("old"));
                }
                if self.new_value.is_none() {
                    return Err(missing("new"));
                }
            }
            Operation::Delete => {
                if self.new_value.is_some() {
                    return Err(DeltaError::DeleteWithNewValue {
                        key: self.key.clone(),
                    });
                }
                if self.old_value.is_none() {
                    return Err(missing("old"));
                }
            }
        }
        Ok(())
    }

    /// The mutation that undoes this one.
    pub fn inverse(&self) -> Delta {
        let operation = match self.operation {
            Operation::Create => Operation::Delete,
            Operation::Update => Operation::Update,
            Operation::Delete => Operation::Create,
        };
        Delta {
            store: self.store.clone(),
            key: self.key.clone(),
            operation,
            old_value: self.new_value.clone(),
            new_value: self.old_value.clone(),
            block_number: self.block_number,
        }
    }
}

/// Short printable form of a stored value.
fn preview(value: &Option<Vec<u8>>) -> String {
    const MAX: usize = 64;
    match value {
        None => "nil".to_string(),
        Some(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            if text.chars().count() > MAX {
                let cut: String = text.chars().take(MAX).collect();
                format!("{cut}…")
            } else {
                text.into_owned()
            }
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {} @{}: {} -> {}",
            self.store,
            self.key,
            self.operation,
            self.block_number,
            preview(&self.old_value),
            preview(&self.new_value)
        )
    }
}
