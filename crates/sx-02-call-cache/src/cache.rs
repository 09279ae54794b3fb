//! # Call Cache
//!
//! Entries live in memory behind a lock so the cache can be shared between
//! the extractor that fills it and the driver that saves it.

use crate::errors::CacheError;
use crate::request::CallKey;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_store::ObjectStore;
use shared_types::BlockNum;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// On-disk form of one cache epoch.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    start: BlockNum,
    end: BlockNum,
    entries: Vec<CacheEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    key: CallKey,
    #[serde(with = "hex")]
    value: Vec<u8>,
}

/// Lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Write-once memo of external call results for one block window.
pub struct CallCache {
    io: Arc<dyn ObjectStore>,
    start: BlockNum,
    end: BlockNum,
    entries: RwLock<BTreeMap<CallKey, Vec<u8>>>,
    /// Set by `put`, cleared by `save`.
    dirty: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CallCache {
    /// Create an empty cache valid for blocks `start..=end`.
    pub fn new(io: Arc<dyn ObjectStore>, start: BlockNum, end: BlockNum) -> Result<Self, CacheError> {
        if start > end {
            return Err(CacheError::InvalidRange { start, end });
        }
        Ok(Self {
            io,
            start,
            end,
            entries: RwLock::new(BTreeMap::new()),
            dirty: AtomicBool::new(false),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    pub fn range(&self) -> (BlockNum, BlockNum) {
        (self.start, self.end)
    }

    /// Whether `block` lies inside the validity window.
    pub fn contains_block(&self, block: BlockNum) -> bool {
        (self.start..=self.end).contains(&block)
    }

    /// Object name of this epoch.
    pub fn artifact_name(&self) -> String {
        format!("cache-{:010}-{:010}.json", self.start, self.end)
    }

    pub fn get(&self, key: &CallKey) -> Option<Vec<u8>> {
        let found = self.entries.read().get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Store `value` under `key` unless an entry already exists.
    ///
    /// Returns `false` when the key was already cached; the existing value is
    /// kept.
    pub fn put(&self, key: CallKey, value: Vec<u8>) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, value);
        self.dirty.store(true, Ordering::Relaxed);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Bulk-load the epoch artifact. Returns the number of entries added.
    ///
    /// A missing artifact loads nothing. Entries already in memory win over
    /// loaded ones.
    pub async fn load(&self) -> Result<usize, CacheError> {
        let artifact = self.artifact_name();
        let bytes = match self.io.read_object(&artifact).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                debug!(artifact = %artifact, "No call cache artifact, starting empty");
                return Ok(0);
            }
            Err(source) => return Err(CacheError::Load { artifact, source }),
        };

        let file: CacheFile =
            serde_json::from_slice(&bytes).map_err(|source| CacheError::Corrupted {
                artifact: artifact.clone(),
                source,
            })?;
        if file.start != self.start || file.end != self.end {
            return Err(CacheError::RangeMismatch {
                artifact,
                start: self.start,
                end: self.end,
                found_start: file.start,
                found_end: file.end,
            });
        }

        let mut added = 0;
        let mut entries = self.entries.write();
        for entry in file.entries {
            if let std::collections::btree_map::Entry::Vacant(slot) = entries.entry(entry.key) {
                slot.insert(entry.value);
                added += 1;
            }
        }
        drop(entries);

        info!(artifact = %artifact, entries = added, "Call cache loaded");
        Ok(added)
    }

    /// Persist every entry to the epoch artifact.
    pub async fn save(&self) -> Result<(), CacheError> {
        let artifact = self.artifact_name();
        let file = {
            let entries = self.entries.read();
            CacheFile {
                start: self.start,
                end: self.end,
                entries: entries
                    .iter()
                    .map(|(key, value)| CacheEntry {
                        key: key.clone(),
                        value: value.clone(),
                    })
                    .collect(),
            }
        };
        let count = file.entries.len();

        let bytes = serde_json::to_vec_pretty(&file).map_err(|source| CacheError::Encode {
            artifact: artifact.clone(),
            source,
        })?;
        self.io
            .write_object(&artifact, bytes)
            .await
            .map_err(|source| CacheError::Save {
                artifact: artifact.clone(),
                source,
            })?;

        self.dirty.store(false, Ordering::Relaxed);
        info!(artifact = %artifact, entries = count, "Call cache saved");
        Ok(())
    }

    /// Whether entries were added since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for CallCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallCache")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("entries", &self.len())
            .field("io", &self.io.describe())
            .finish()
    }
}
