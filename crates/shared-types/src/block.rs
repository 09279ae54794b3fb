//! # Blocks
//!
//! The pipeline never looks inside a block beyond its height, id and
//! timestamp. The payload is handed to extractors as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Height of a block in the chain.
pub type BlockNum = u64;

/// One unit of the ordered, irreversible input sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block height.
    pub number: BlockNum,
    /// Unique block identifier (hash, hex encoded).
    pub id: String,
    /// Identifier of the parent block.
    #[serde(default)]
    pub parent_id: String,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Encoded payload, decoded only by extractors.
    #[serde(with = "hex")]
    pub payload: Vec<u8>,
}

impl Block {
    /// Create a block with an empty parent id.
    pub fn new(number: BlockNum, id: impl Into<String>, timestamp: u64, payload: Vec<u8>) -> Self {
        Self {
            number,
            id: id.into(),
            parent_id: String::new(),
            timestamp,
            payload,
        }
    }

    /// Lightweight reference used to tag checkpoints and delta segments.
    pub fn block_ref(&self) -> BlockRef {
        BlockRef {
            number: self.number,
            id: self.id.clone(),
        }
    }
}

/// Height and id of a block, without its payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BlockRef {
    pub number: BlockNum,
    pub id: String,
}

impl BlockRef {
    pub fn new(number: BlockNum, id: impl Into<String>) -> Self {
        Self {
            number,
            id: id.into(),
        }
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id.is_empty() {
            write!(f, "#{}", self.number)
        } else {
            write!(f, "#{} ({})", self.number, self.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_ref_from_block() {
        let block = Block::new(42, "0xabc", 1_700_000_000, vec![1, 2, 3]);
        let r = block.block_ref();
        assert_eq!(r.number, 42);
        assert_eq!(r.id, "0xabc");
        assert_eq!(r.to_string(), "#42 (0xabc)");
    }

    #[test]
    fn test_block_json_payload_is_hex() {
        let block = Block::new(7, "0x07", 10, vec![0xde, 0xad]);
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"payload\":\"dead\""));

        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_parent_id_defaults_when_missing() {
        let json = r#"{"number":1,"id":"0x01","timestamp":5,"payload":""}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert!(block.parent_id.is_empty());
        assert!(block.payload.is_empty());
    }
}
