use super::errors::{LoadError, PersistenceError, StoreError};
use super::names::{
    checkpoint_name, checkpoint_prefix, parse_block, progress_name, segment_name,
    segment_prefix, validate_store_name,
};
use crate::adapters::codec::{CheckpointFile, DeltaSegment, ProgressMarker};
use crate::ports::StoreReader;
use shared_store::{ObjectStore, ObjectStoreError};
use shared_types::{BlockNum, BlockRef, Delta, Operation};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::sync::Arc;
use tracing::{debug, info};

/// Named, ordered key/value map with a per-block delta buffer.
///
/// Owned by exactly one writer; no internal locking.
pub struct Store {
    name: String,
    kv: BTreeMap<String, Vec<u8>>,
    /// Deltas of the current block, in mutation order.
    deltas: Vec<Delta>,
    /// Block that mutations are attributed to.
    block: BlockNum,
    last_checkpoint: Option<BlockNum>,
    io: Arc<dyn ObjectStore>,
}

impl Store {
    /// Create an empty store persisting to `io`.
    pub fn new(name: impl Into<String>, io: Arc<dyn ObjectStore>) -> Result<Self, StoreError> {
        let name = name.into();
        validate_store_name(&name)?;
        Ok(Self {
            name,
            kv: BTreeMap::new(),
            deltas: Vec::new(),
            block: 0,
            last_checkpoint: None,
            io,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block the pending deltas are attributed to.
    pub fn block_number(&self) -> BlockNum {
        self.block
    }

    /// Tag of the last checkpoint written or loaded.
    pub fn last_checkpoint(&self) -> Option<BlockNum> {
        self.last_checkpoint
    }

    pub fn len(&self) -> usize {
        self.kv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kv.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.kv.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.kv.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    // =========================================================================
    // BLOCK LIFECYCLE
    // =========================================================================

    /// Start attributing mutations to `block`.
    ///
    /// Refuses while a different block's deltas are still buffered.
    pub fn begin_block(&mut self, block: BlockNum) -> Result<(), StoreError> {
        if let Some(pending) = self.deltas.first() {
            if pending.block_number != block {
                return Err(StoreError::UnflushedDeltas {
                    store: self.name.clone(),
                    pending: self.deltas.len(),
                    buffered_block: pending.block_number,
                    block,
                });
            }
        }
        self.block = block;
        Ok(())
    }

    /// Deltas recorded since the last flush, in order.
    pub fn deltas(&self) -> &[Delta] {
        &self.deltas
    }

    /// Drop the delta buffer. The map keeps its contents.
    pub fn flush(&mut self) {
        self.deltas = Vec::new();
    }

    /// Undo the buffered deltas, newest first, and clear the buffer.
    ///
    /// Restores the map to its state at the last flush.
    pub fn rollback_block(&mut self) {
        let deltas = std::mem::take(&mut self.deltas);
        if deltas.is_empty() {
            return;
        }
        for delta in deltas.iter().rev() {
            match &delta.old_value {
                Some(old) => {
                    self.kv.insert(delta.key.clone(), old.clone());
                }
                None => {
                    self.kv.remove(&delta.key);
                }
            }
        }
        debug!(store = %self.name, block = self.block, undone = deltas.len(), "Block rolled back");
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Write `value` at `key`. Records a create or an update.
    pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) {
        let key = key.into();
        let delta = match self.kv.insert(key.clone(), value.clone()) {
            Some(old) => Delta::update(self.name.as_str(), key, old, value, self.block),
            None => Delta::create(self.name.as_str(), key, value, self.block),
        };
        self.deltas.push(delta);
    }

    /// Write `value` only if `key` is absent. Returns whether it was written.
    pub fn set_if_not_exists(&mut self, key: impl Into<String>, value: Vec<u8>) -> bool {
        let key = key.into();
        if self.kv.contains_key(&key) {
            return false;
        }
        self.set(key, value);
        true
    }

    /// Remove `key`. Missing keys record nothing and return `false`.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.kv.remove(key) {
            Some(old) => {
                self.deltas
                    .push(Delta::delete(self.name.as_str(), key, old, self.block));
                true
            }
            None => false,
        }
    }

    /// Remove every key starting with `prefix`, in key order.
    pub fn delete_prefix(&mut self, prefix: &str) -> usize {
        let keys: Vec<String> = self
            .kv
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            self.delete(key);
        }
        keys.len()
    }

    /// Add `delta` to the decimal integer at `key` (absent counts as 0).
    pub fn sum_i64(&mut self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let current = match self.kv.get(key) {
            Some(raw) => parse_number::<i64>(raw).ok_or_else(|| self.not_a_number(key))?,
            None => 0,
        };
        let total = current.saturating_add(delta);
        self.set(key, total.to_string().into_bytes());
        Ok(total)
    }

    /// Add `delta` to the decimal float at `key` (absent counts as 0).
    pub fn sum_f64(&mut self, key: &str, delta: f64) -> Result<f64, StoreError> {
        let current = match self.kv.get(key) {
            Some(raw) => parse_number::<f64>(raw).ok_or_else(|| self.not_a_number(key))?,
            None => 0.0,
        };
        let total = current + delta;
        self.set(key, total.to_string().into_bytes());
        Ok(total)
    }

    fn not_a_number(&self, key: &str) -> StoreError {
        StoreError::NotANumber {
            store: self.name.clone(),
            key: key.to_string(),
        }
    }

    /// Apply recorded deltas without recording them again.
    ///
    /// Every delta must belong to this store and its old value must match
    /// the current state. Nothing is applied if any delta is rejected.
    pub fn apply_deltas(&mut self, deltas: &[Delta]) -> Result<(), StoreError> {
        apply_to(&self.name, &mut self.kv, deltas)
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Load state for a run starting at `target`.
    ///
    /// Picks the highest checkpoint tagged `<= target`, then replays delta
    /// segments of blocks in `[checkpoint, target)`. Fails if blocks below
    /// `target` were never processed. On error the store is left untouched;
    /// on success the buffer is cleared and subsequent mutations are
    /// attributed to `target`.
    pub async fn init(&mut self, target: BlockNum) -> Result<(), LoadError> {
        let checkpoints = self.list_artifacts(&checkpoint_prefix(&self.name)).await?;
        let Some(tag) = checkpoints.iter().copied().filter(|b| *b <= target).max() else {
            return Err(LoadError::NoCheckpoint {
                store: self.name.clone(),
                target,
            });
        };

        if tag < target {
            // A checkpoint at H also proves every block below H was processed
            let highest = checkpoints.iter().copied().max().unwrap_or(tag);
            let processed = self.read_progress().await?.map_or(highest, |p| p.max(highest));
            if processed < target {
                return Err(LoadError::NotProcessed {
                    store: self.name.clone(),
                    processed,
                    target,
                });
            }
        }

        let artifact = checkpoint_name(&self.name, tag);
        let bytes = self.read_artifact(&artifact).await?;
        let file = CheckpointFile::decode(&bytes).map_err(|source| LoadError::Corrupted {
            store: self.name.clone(),
            artifact: artifact.clone(),
            source,
        })?;
        self.check_owner(&artifact, &file.store)?;
        let mut kv = file.entries;

        let mut segments: Vec<BlockNum> = self
            .list_artifacts(&segment_prefix(&self.name))
            .await?
            .into_iter()
            .filter(|b| *b >= tag && *b < target)
            .collect();
        segments.sort_unstable();

        for block in &segments {
            let artifact = segment_name(&self.name, *block);
            let bytes = self.read_artifact(&artifact).await?;
            let segment = DeltaSegment::decode(&bytes).map_err(|source| LoadError::Corrupted {
                store: self.name.clone(),
                artifact: artifact.clone(),
                source,
            })?;
            self.check_owner(&artifact, &segment.store)?;
            apply_to(&self.name, &mut kv, &segment.deltas).map_err(|source| LoadError::Replay {
                store: self.name.clone(),
                block: *block,
                source,
            })?;
        }

        self.kv = kv;
        self.deltas.clear();
        self.block = target;
        self.last_checkpoint = Some(tag);
        info!(
            store = %self.name,
            checkpoint = tag,
            replayed = segments.len(),
            keys = self.kv.len(),
            target,
            "State loaded"
        );
        Ok(())
    }

    /// Write a checkpoint of the whole map tagged with `block.number`.
    ///
    /// Only the height goes into the artifact: the same tag with the same
    /// state always produces the same bytes.
    pub async fn write_state(&mut self, block: &BlockRef) -> Result<(), PersistenceError> {
        let artifact = checkpoint_name(&self.name, block.number);
        let file = CheckpointFile {
            store: self.name.clone(),
            block: block.number,
            entries: self.kv.clone(),
        };
        let bytes = file.encode().map_err(|source| PersistenceError::Encode {
            store: self.name.clone(),
            artifact: artifact.clone(),
            source,
        })?;
        self.write_artifact(artifact, bytes).await?;

        self.last_checkpoint = Some(block.number);
        info!(store = %self.name, block = %block, keys = self.kv.len(), "Checkpoint written");
        Ok(())
    }

    /// Persist the current block's deltas as a segment, then record the
    /// block as processed. Empty buffers write no segment.
    pub async fn store_block(&self, block: &BlockRef) -> Result<(), PersistenceError> {
        if !self.deltas.is_empty() {
            let artifact = segment_name(&self.name, block.number);
            let segment = DeltaSegment {
                store: self.name.clone(),
                block: block.clone(),
                deltas: self.deltas.clone(),
            };
            let bytes = segment.encode().map_err(|source| PersistenceError::Encode {
                store: self.name.clone(),
                artifact: artifact.clone(),
                source,
            })?;
            self.write_artifact(artifact, bytes).await?;
            debug!(store = %self.name, block = %block, deltas = self.deltas.len(), "Delta segment stored");
        }

        let artifact = progress_name(&self.name);
        let marker = ProgressMarker {
            store: self.name.clone(),
            next_block: block.number + 1,
        };
        let bytes = marker.encode().map_err(|source| PersistenceError::Encode {
            store: self.name.clone(),
            artifact: artifact.clone(),
            source,
        })?;
        self.write_artifact(artifact, bytes).await
    }

    /// Log the buffered deltas, one event per delta.
    pub fn print_deltas(&self) {
        for delta in &self.deltas {
            debug!(store = %self.name, "{delta}");
        }
    }

    async fn list_artifacts(&self, prefix: &str) -> Result<Vec<BlockNum>, LoadError> {
        let names = self
            .io
            .list_objects(prefix)
            .await
            .map_err(|source| self.storage_error(source))?;
        Ok(names
            .iter()
            .filter_map(|name| parse_block(name, prefix))
            .collect())
    }

    async fn write_artifact(&self, artifact: String, bytes: Vec<u8>) -> Result<(), PersistenceError> {
        self.io
            .write_object(&artifact, bytes)
            .await
            .map_err(|source| PersistenceError::Storage {
                store: self.name.clone(),
                artifact,
                source,
            })
    }

    /// Height below which the last run processed every block, if recorded.
    async fn read_progress(&self) -> Result<Option<BlockNum>, LoadError> {
        let artifact = progress_name(&self.name);
        let bytes = match self.io.read_object(&artifact).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(self.storage_error(e)),
        };
        let marker = ProgressMarker::decode(&bytes).map_err(|source| LoadError::Corrupted {
            store: self.name.clone(),
            artifact: artifact.clone(),
            source,
        })?;
        self.check_owner(&artifact, &marker.store)?;
        Ok(Some(marker.next_block))
    }

    async fn read_artifact(&self, artifact: &str) -> Result<Vec<u8>, LoadError> {
        self.io
            .read_object(artifact)
            .await
            .map_err(|source| self.storage_error(source))
    }

    fn storage_error(&self, source: ObjectStoreError) -> LoadError {
        LoadError::Storage {
            store: self.name.clone(),
            source,
        }
    }

    fn check_owner(&self, artifact: &str, found: &str) -> Result<(), LoadError> {
        if found == self.name {
            return Ok(());
        }
        Err(LoadError::WrongStore {
            artifact: artifact.to_string(),
            expected: self.name.clone(),
            found: found.to_string(),
        })
    }
}

/// Stage `deltas` against `kv` and commit them only if all are accepted.
fn apply_to(
    name: &str,
    kv: &mut BTreeMap<String, Vec<u8>>,
    deltas: &[Delta],
) -> Result<(), StoreError> {
    let mut staged: BTreeMap<&str, Option<&[u8]>> = BTreeMap::new();

    for delta in deltas {
        if delta.store != name {
            return Err(StoreError::WrongStore {
                store: name.to_string(),
                found: delta.store.clone(),
            });
        }
        delta.validate().map_err(|source| StoreError::InvalidDelta {
            store: name.to_string(),
            source,
        })?;

        let current = match staged.get(delta.key.as_str()) {
            Some(value) => *value,
            None => kv.get(&delta.key).map(Vec::as_slice),
        };
        let expected = match delta.operation {
            Operation::Create => None,
            Operation::Update | Operation::Delete => delta.old_value.as_deref(),
        };
        if current != expected {
            return Err(StoreError::OldValueMismatch {
                store: name.to_string(),
                key: delta.key.clone(),
                block: delta.block_number,
            });
        }
        staged.insert(&delta.key, delta.new_value.as_deref());
    }

    for (key, value) in staged {
        match value {
            Some(v) => {
                kv.insert(key.to_string(), v.to_vec());
            }
            None => {
                kv.remove(key);
            }
        }
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(raw: &[u8]) -> Option<T> {
    std::str::from_utf8(raw).ok()?.trim().parse().ok()
}

impl StoreReader for Store {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<&[u8]> {
        Store::get(self, key)
    }

    fn scan_prefix<'a>(&'a self, prefix: &'a str) -> Box<dyn Iterator<Item = (&'a str, &'a [u8])> + 'a> {
        Box::new(
            self.kv
                .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
                .take_while(move |(k, _)| k.starts_with(prefix))
                .map(|(k, v)| (k.as_str(), v.as_slice())),
        )
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("keys", &self.kv.len())
            .field("pending_deltas", &self.deltas.len())
            .field("block", &self.block)
            .field("last_checkpoint", &self.last_checkpoint)
            .field("io", &self.io.describe())
            .finish()
    }
}
