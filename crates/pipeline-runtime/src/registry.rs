//! # Store Registry
//!
//! The four exchange stores, owned by the driver. Iteration follows build
//! order: `pairs`, `prices`, `total_pairs`, `volume24h`.

use shared_store::ObjectStore;
use shared_types::{BlockNum, BlockRef};
use std::sync::Arc;
use sx_01_state_store::{LoadError, PersistenceError, Store, StoreError};
use sx_03_exchange::stores;

pub struct StoreRegistry {
    pub pairs: Store,
    pub prices: Store,
    pub total_pairs: Store,
    pub volume24h: Store,
}

impl StoreRegistry {
    /// Create empty stores sharing one object store.
    pub fn new(io: Arc<dyn ObjectStore>) -> Result<Self, StoreError> {
        Ok(Self {
            pairs: Store::new(stores::PAIRS, io.clone())?,
            prices: Store::new(stores::PRICES, io.clone())?,
            total_pairs: Store::new(stores::TOTAL_PAIRS, io.clone())?,
            volume24h: Store::new(stores::VOLUME_24H, io)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Store> {
        [&self.pairs, &self.prices, &self.total_pairs, &self.volume24h].into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Store> {
        [
            &mut self.pairs,
            &mut self.prices,
            &mut self.total_pairs,
            &mut self.volume24h,
        ]
        .into_iter()
    }

    pub fn get(&self, name: &str) -> Option<&Store> {
        self.iter().find(|s| s.name() == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn begin_block(&mut self, block: BlockNum) -> Result<(), StoreError> {
        self.iter_mut().try_for_each(|s| s.begin_block(block))
    }

    /// Load every store for a run starting at `target`.
    pub async fn init_all(&mut self, target: BlockNum) -> Result<(), LoadError> {
        for store in self.iter_mut() {
            store.init(target).await?;
        }
        Ok(())
    }

    pub async fn write_state_all(&mut self, block: &BlockRef) -> Result<(), PersistenceError> {
        for store in self.iter_mut() {
            store.write_state(block).await?;
        }
        Ok(())
    }

    pub async fn store_block_all(&self, block: &BlockRef) -> Result<(), PersistenceError> {
        for store in self.iter() {
            store.store_block(block).await?;
        }
        Ok(())
    }

    pub fn flush_all(&mut self) {
        self.iter_mut().for_each(Store::flush);
    }

    pub fn rollback_all(&mut self) {
        self.iter_mut().for_each(Store::rollback_block);
    }

    /// Buffered deltas across all stores.
    pub fn pending_deltas(&self) -> usize {
        self.iter().map(|s| s.deltas().len()).sum()
    }
}
