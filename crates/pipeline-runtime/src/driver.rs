//! # Pipeline Driver
//!
//! Runs the per-block steady state and owns the stop condition.
//!
//! ```text
//!              block >= start + count
//!   Running ─────────────────────────→ Stopping ──→ Stopped
//!      │      (checkpoints, cache save,               ↑
//!      │       hub close)                             │
//!      └──────────── block aborted ───────────────────┘
//! ```
//!
//! ## Per-block steps
//!
//! 1. decode the payload
//! 2. extract and build, store by store, in dependency order
//! 3. broadcast each store's deltas to its topic
//! 4. persist the block's delta segments (and a periodic checkpoint)
//! 5. flush every delta buffer
//!
//! A failure in 1-4 undoes the block's deltas in memory and halts the
//! driver. Deltas already handed to the hub cannot be retracted, so a failed
//! run is never resumed in-process.

use crate::errors::{PipelineError, StepError};
use crate::registry::StoreRegistry;
use crate::config::RunConfig;
use shared_bus::SubscriptionHub;
use shared_types::{Block, BlockNum, BlockRef};
use std::sync::Arc;
use sx_02_call_cache::{CachedCaller, CallClient};
use sx_03_exchange::{
    ExchangeBlock, PairExtractor, PairsStateBuilder, PricesStateBuilder, ReservesExtractor,
    SwapsExtractor, TotalPairsStateBuilder, Volume24hStateBuilder,
};
use sx_telemetry::{
    BLOCKS_PROCESSED, BLOCK_PROCESSING_DURATION, CALL_CACHE_LOOKUPS,
    CHECKPOINTS_WRITTEN, CURRENT_BLOCK, DELTAS_BROADCAST, DELTAS_RECORDED, PIPELINE_ERRORS,
};
use tracing::{debug, error, info, warn};

/// Driver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Stopping,
    Stopped,
}

/// Result of handing one block to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Block committed; send the next one.
    Continue,
    /// The run is complete. Not an error.
    EndOfStream,
}

/// The block driver.
pub struct Pipeline<C> {
    run: RunConfig,
    state: DriverState,
    stores: StoreRegistry,
    hub: Arc<SubscriptionHub>,
    caller: Arc<CachedCaller<C>>,
    pair_extractor: PairExtractor<C>,
    last_block: Option<BlockNum>,
    /// Cache counters already reported to metrics.
    reported_hits: u64,
    reported_misses: u64,
}

impl<C: CallClient + 'static> Pipeline<C> {
    /// Create the driver and register one hub topic per store.
    pub fn new(
        run: RunConfig,
        stores: StoreRegistry,
        hub: Arc<SubscriptionHub>,
        caller: Arc<CachedCaller<C>>,
        factory: Option<String>,
    ) -> Result<Self, PipelineError> {
        for topic in stores.names() {
            hub.register_topic(&topic)
                .map_err(|source| PipelineError::Registration { topic, source })?;
        }

        Ok(Self {
            pair_extractor: PairExtractor::new(factory, caller.clone()),
            run,
            state: DriverState::Running,
            stores,
            hub,
            caller,
            last_block: None,
            reported_hits: 0,
            reported_misses: 0,
        })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn stores(&self) -> &StoreRegistry {
        &self.stores
    }

    pub fn hub(&self) -> &Arc<SubscriptionHub> {
        &self.hub
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run
    }

    /// Last committed block.
    pub fn last_block(&self) -> Option<BlockNum> {
        self.last_block
    }

    /// Load state for the start block and warm the call cache.
    ///
    /// Starting at genesis needs no stored state. An unusable cache only
    /// costs extra external calls.
    pub async fn prepare(&mut self) -> Result<(), PipelineError> {
        let start = self.run.start_block;
        if start > 0 {
            self.stores.init_all(start).await?;
            info!(block = start, "Stores loaded");
        }

        match self.caller.cache().load().await {
            Ok(loaded) => info!(entries = loaded, "Call cache loaded"),
            Err(e) => warn!(error = %e, "Call cache unavailable, starting empty"),
        }
        Ok(())
    }

    /// Process one block, or stop when it is the terminating block.
    pub async fn handle_block(&mut self, block: &Block) -> Result<HandlerOutcome, PipelineError> {
        if self.state != DriverState::Running {
            return Err(PipelineError::NotRunning {
                state: self.state,
                block: block.number,
            });
        }
        if block.number < self.run.start_block {
            return Err(PipelineError::BeforeStart {
                block: block.number,
                start: self.run.start_block,
            });
        }
        if let Some(last) = self.last_block.filter(|last| block.number <= *last) {
            return Err(PipelineError::OutOfOrder {
                block: block.number,
                last,
            });
        }

        if block.number >= self.run.stop_block() {
            self.stop(block.block_ref()).await?;
            return Ok(HandlerOutcome::EndOfStream);
        }

        let timer = sx_telemetry::time_histogram!(BLOCK_PROCESSING_DURATION);
        if let Err(source) = self.process_block(block).await {
            drop(timer);
            self.stores.rollback_all();
            PIPELINE_ERRORS.with_label_values(&[source.kind()]).inc();
            error!(block = block.number, error = %source, "Block aborted, halting");
            self.hub.close();
            self.state = DriverState::Stopped;
            return Err(PipelineError::BlockAborted {
                block: block.number,
                source,
            });
        }
        drop(timer);

        self.last_block = Some(block.number);
        BLOCKS_PROCESSED.inc();
        CURRENT_BLOCK.set(block.number as f64);
        self.report_cache_lookups();
        Ok(HandlerOutcome::Continue)
    }

    /// Stop after the block source ran dry before the terminating block.
    ///
    /// The final checkpoint is tagged with the block after the last committed
    /// one. A stopped driver is left as is.
    pub async fn finish(&mut self) -> Result<(), PipelineError> {
        if self.state != DriverState::Running {
            return Ok(());
        }
        let next = self
            .last_block
            .map_or(self.run.start_block, |last| last + 1);
        self.stop(BlockRef::new(next, "")).await
    }

    async fn stop(&mut self, tag: BlockRef) -> Result<(), PipelineError> {
        self.state = DriverState::Stopping;
        info!(block = %tag, "Stopping, writing final state");

        let result = self.write_final_state(&tag).await;
        self.hub.close();
        self.state = DriverState::Stopped;

        if let Err(e) = &result {
            PIPELINE_ERRORS.with_label_values(&[e.kind()]).inc();
            error!(block = %tag, error = %e, "Final state not written");
        }
        result
    }

    async fn write_final_state(&mut self, tag: &BlockRef) -> Result<(), PipelineError> {
        self.stores
            .write_state_all(tag)
            .await
            .map_err(PipelineError::Checkpoint)?;
        self.count_checkpoints();

        self.caller
            .cache()
            .save()
            .await
            .map_err(PipelineError::CacheSave)?;
        Ok(())
    }

    async fn process_block(&mut self, block: &Block) -> Result<(), StepError> {
        let number = block.number;
        self.stores.begin_block(number)?;
        info!("BLOCK +{} {} {}", number - self.run.start_block, number, block.id);

        let decoded = ExchangeBlock::decode(block)?;

        let pairs = self.pair_extractor.extract(&decoded).await?;
        pairs.print();
        let created = PairsStateBuilder.build(&pairs, &mut self.stores.pairs)?;
        if created > 0 {
            debug!(block = number, created, "New pairs");
        }

        let reserves = ReservesExtractor.extract(&decoded, &self.stores.pairs)?;
        reserves.print();
        PricesStateBuilder.build(&reserves, &self.stores.pairs, &mut self.stores.prices)?;

        let swaps = SwapsExtractor.extract(&decoded, &self.stores.pairs, &self.stores.prices)?;
        swaps.print();
        TotalPairsStateBuilder.build(created, &swaps, &mut self.stores.total_pairs)?;
        Volume24hStateBuilder.build(decoded.timestamp, &swaps, &mut self.stores.volume24h)?;

        self.broadcast().await?;

        self.stores.store_block_all(&block.block_ref()).await?;
        if self.checkpoint_due(number) {
            self.stores
                .write_state_all(&BlockRef::new(number + 1, ""))
                .await?;
            self.count_checkpoints();
        }

        self.stores.flush_all();
        Ok(())
    }

    /// Send each store's deltas to its topic, in store order.
    ///
    /// Topics are not sent atomically. When a later topic fails, subscribers
    /// of earlier topics have already received this block's deltas, and the
    /// block is rolled back anyway. They see those deltas right before
    /// [`HubError::Closed`](shared_bus::HubError::Closed), and nothing of the
    /// block is persisted.
    async fn broadcast(&self) -> Result<(), StepError> {
        for store in self.stores.iter() {
            let deltas = store.deltas();
            if deltas.is_empty() {
                continue;
            }
            store.print_deltas();
            for delta in deltas {
                DELTAS_RECORDED
                    .with_label_values(&[store.name(), delta.operation.as_str()])
                    .inc();
            }

            self.hub
                .broadcast_deltas(store.name(), deltas)
                .await
                .map_err(|source| StepError::Broadcast {
                    topic: store.name().to_string(),
                    source,
                })?;
            DELTAS_BROADCAST
                .with_label_values(&[store.name()])
                .inc_by(deltas.len() as f64);
        }
        Ok(())
    }

    fn checkpoint_due(&self, number: BlockNum) -> bool {
        self.run
            .checkpoint_interval
            .is_some_and(|interval| (number + 1 - self.run.start_block) % interval == 0)
    }

    fn count_checkpoints(&self) {
        for store in self.stores.iter() {
            CHECKPOINTS_WRITTEN.with_label_values(&[store.name()]).inc();
        }
    }

    fn report_cache_lookups(&mut self) {
        let stats = self.caller.cache().stats();
        let hits = stats.hits.saturating_sub(self.reported_hits);
        let misses = stats.misses.saturating_sub(self.reported_misses);
        if hits > 0 {
            CALL_CACHE_LOOKUPS.with_label_values(&["hit"]).inc_by(hits as f64);
        }
        if misses > 0 {
            CALL_CACHE_LOOKUPS.with_label_values(&["miss"]).inc_by(misses as f64);
        }
        self.reported_hits = stats.hits;
        self.reported_misses = stats.misses;
    }
}
