//! Framed bincode encoding.
//!
//! ```text
//! ┌────────┬─────────┬──────┬──────────┬────────────┬────────────────┐
//! │ "SXKV" │ version │ kind │ crc32 LE │ length LE  │ bincode body   │
//! │ 4 B    │ 1 B     │ 1 B  │ 4 B      │ 8 B        │ length B       │
//! └────────┴─────────┴──────┴──────────┴────────────┴────────────────┘
//! ```
//!
//! The checksum covers the body only.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{BlockNum, BlockRef, Delta};
use std::collections::BTreeMap;
use thiserror::Error;

const MAGIC: &[u8; 4] = b"SXKV";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1 + 1 + 4 + 8;

const KIND_CHECKPOINT: u8 = 1;
const KIND_SEGMENT: u8 = 2;
const KIND_PROGRESS: u8 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("artifact truncated: {len} bytes")]
    Truncated { len: usize },

    #[error("bad magic bytes")]
    BadMagic,

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error("unexpected artifact kind {found}, expected {expected}")]
    WrongKind { expected: u8, found: u8 },

    #[error("checksum mismatch: stored {stored:08x}, computed {computed:08x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Full contents of one store at a block boundary.
///
/// Only the height is recorded, so the bytes depend on nothing but the
/// store name, the tag and the state.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointFile {
    pub store: String,
    /// Every block below this height is applied.
    pub block: BlockNum,
    #[serde_as(as = "BTreeMap<_, Bytes>")]
    pub entries: BTreeMap<String, Vec<u8>>,
}

/// Deltas one block recorded in one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaSegment {
    pub store: String,
    pub block: BlockRef,
    pub deltas: Vec<Delta>,
}

/// Height up to which a store has processed blocks, deltas or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMarker {
    pub store: String,
    /// Every block below this height has been processed.
    pub next_block: BlockNum,
}

impl CheckpointFile {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode_framed(KIND_CHECKPOINT, self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_framed(KIND_CHECKPOINT, bytes)
    }
}

impl DeltaSegment {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode_framed(KIND_SEGMENT, self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_framed(KIND_SEGMENT, bytes)
    }
}

impl ProgressMarker {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode_framed(KIND_PROGRESS, self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_framed(KIND_PROGRESS, bytes)
    }
}

fn encode_framed<T: Serialize>(kind: u8, value: &T) -> Result<Vec<u8>, CodecError> {
    let body = bincode::serialize(value).map_err(|e| CodecError::Serialization(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.push(kind);
    out.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    out.extend_from_slice(&(body.len() as u64).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

fn decode_framed<T: DeserializeOwned>(kind: u8, bytes: &[u8]) -> Result<T, CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated { len: bytes.len() });
    }
    let (header, body) = bytes.split_at(HEADER_LEN);

    if &header[0..4] != MAGIC {
        return Err(CodecError::BadMagic);
    }
    if header[4] != VERSION {
        return Err(CodecError::UnsupportedVersion(header[4]));
    }
    if header[5] != kind {
        return Err(CodecError::WrongKind {
            expected: kind,
            found: header[5],
        });
    }

    let stored = u32::from_le_bytes([header[6], header[7], header[8], header[9]]);
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&header[10..18]);
    let len = u64::from_le_bytes(len_bytes);
    if len != body.len() as u64 {
        return Err(CodecError::Truncated { len: bytes.len() });
    }

    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(CodecError::ChecksumMismatch { stored, computed });
    }

    bincode::deserialize(body).map_err(|e| CodecError::Serialization(e.to_string()))
}
