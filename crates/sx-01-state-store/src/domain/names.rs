//! Store and artifact naming.
//!
//! Artifacts are flat object names, zero padded so lexical order matches
//! block order:
//!
//! - `state-{store}-{block:010}.kv`: checkpoint
//! - `deltas-{store}-{block:010}.kv`: delta segment of one block
//! - `progress-{store}.kv`: height the last run processed up to

use super::errors::StoreError;
use shared_types::BlockNum;

const CHECKPOINT_PREFIX: &str = "state";
const SEGMENT_PREFIX: &str = "deltas";
const PROGRESS_PREFIX: &str = "progress";
const EXTENSION: &str = ".kv";

/// Store names must be non-empty `[a-z0-9_]+`.
pub fn validate_store_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName {
            name: name.to_string(),
        })
    }
}

pub fn checkpoint_name(store: &str, block: BlockNum) -> String {
    format!("{}{block:010}{EXTENSION}", checkpoint_prefix(store))
}

pub fn segment_name(store: &str, block: BlockNum) -> String {
    format!("{}{block:010}{EXTENSION}", segment_prefix(store))
}

pub fn progress_name(store: &str) -> String {
    format!("{PROGRESS_PREFIX}-{store}{EXTENSION}")
}

pub(crate) fn checkpoint_prefix(store: &str) -> String {
    format!("{CHECKPOINT_PREFIX}-{store}-")
}

pub(crate) fn segment_prefix(store: &str) -> String {
    format!("{SEGMENT_PREFIX}-{store}-")
}

/// Block number of an artifact listed under `prefix`, if well formed.
pub(crate) fn parse_block(name: &str, prefix: &str) -> Option<BlockNum> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(EXTENSION)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_names() {
        assert!(validate_store_name("pairs").is_ok());
        assert!(validate_store_name("volume24h").is_ok());
        assert!(validate_store_name("total_pairs").is_ok());
        assert!(validate_store_name("").is_err());
        assert!(validate_store_name("Pairs").is_err());
        assert!(validate_store_name("total-pairs").is_err());
        assert!(validate_store_name("a/b").is_err());
    }

    #[test]
    fn test_artifact_names_sort_by_block() {
        let a = checkpoint_name("pairs", 9);
        let b = checkpoint_name("pairs", 10);
        assert_eq!(a, "state-pairs-0000000009.kv");
        assert!(a < b);
        assert_eq!(segment_name("prices", 42), "deltas-prices-0000000042.kv");
        assert_eq!(progress_name("prices"), "progress-prices.kv");
    }

    #[test]
    fn test_parse_block() {
        let prefix = checkpoint_prefix("pairs");
        assert_eq!(parse_block("state-pairs-0000000120.kv", &prefix), Some(120));
        assert_eq!(parse_block("state-pairs-.kv", &prefix), None);
        assert_eq!(parse_block("state-pairs-12x.kv", &prefix), None);
        assert_eq!(parse_block("state-pairs-0000000120.json", &prefix), None);
        // `total_pairs` artifacts never parse under the `pairs` prefix
        assert_eq!(parse_block("state-total_pairs-0000000001.kv", &prefix), None);
    }
}
