//! Shared harness: a scripted exchange chain and a pipeline wired to
//! in-memory object stores.

use async_trait::async_trait;
use pipeline_runtime::{
    BlockSource, IterBlockSource, Pipeline, RunConfig, StoreRegistry, StreamEnd,
};
use shared_bus::{HubConfig, Subscriber, SubscriptionHub};
use shared_store::{InMemoryObjectStore, ObjectStore};
use shared_types::{Block, BlockNum, Delta};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sx_02_call_cache::{CachedCaller, CallCache, CallClient, CallError, CallRequest};
use sx_03_exchange::{ExchangeBlock, ExchangeEvent};

pub const FACTORY: &str = "0xfactory";

/// A new pair every `PAIR_EVERY` blocks.
pub const PAIR_EVERY: BlockNum = 7;

/// One hour per block, so day buckets roll over every 24 blocks.
pub const GENESIS_TIME: u64 = 1_700_000_000;
pub const BLOCK_TIME: u64 = 3_600;

/// store name -> key -> value
pub type Snapshot = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// Node answering `decimals()`: tokens ending in `a` have 6, others 18.
#[derive(Clone, Default)]
pub struct ScriptedNode {
    calls: Arc<AtomicUsize>,
}

impl ScriptedNode {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallClient for ScriptedNode {
    async fn call(&self, request: &CallRequest, _block: BlockNum) -> Result<Vec<u8>, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let decimals = if request.to.ends_with('a') { 6 } else { 18 };
        let mut word = vec![0u8; 32];
        word[31] = decimals;
        Ok(word)
    }
}

pub fn pair_address(created_at: BlockNum) -> String {
    format!("0xpair{created_at}")
}

/// Events of block `n` of the scripted chain.
pub fn scripted_events(n: BlockNum) -> Vec<ExchangeEvent> {
    let mut events = Vec::new();

    // Pairs created in earlier blocks trade and sync
    for k in (0..n).step_by(PAIR_EVERY as usize) {
        let pair = pair_address(k);
        if (n + k) % 3 == 0 {
            events.push(ExchangeEvent::Swap {
                pair: pair.clone(),
                sender: "0xTrader".into(),
                to: "0xTrader".into(),
                amount0_in: 250_000 * u128::from(n % 5 + 1),
                amount1_in: 0,
                amount0_out: 0,
                amount1_out: 10u128.pow(17) * u128::from(k % 4 + 1),
            });
        }
        if (n + k) % 2 == 0 {
            events.push(ExchangeEvent::Sync {
                pair,
                reserve0: 1_000_000 * u128::from(n + 1),
                reserve1: 10u128.pow(18) * u128::from((k + n) % 7 + 1),
            });
        }
    }

    if n % PAIR_EVERY == 0 {
        events.push(ExchangeEvent::PairCreated {
            // Factory addresses compare case-insensitively
            factory: "0xFACTORY".into(),
            pair: pair_address(n),
            token0: format!("0xtok{n}a"),
            token1: format!("0xtok{n}b"),
        });
        // Pair from another factory, never tracked
        events.push(ExchangeEvent::PairCreated {
            factory: "0xotherfactory".into(),
            pair: format!("0xforeign{n}"),
            token0: format!("0xforeign{n}a"),
            token1: format!("0xforeign{n}b"),
        });
    }

    events
}

pub fn scripted_block(n: BlockNum) -> Block {
    let payload = ExchangeBlock::encode_payload(&scripted_events(n)).unwrap();
    Block::new(n, format!("0x{n:08x}"), GENESIS_TIME + n * BLOCK_TIME, payload)
}

/// Blocks `from..=to` of the scripted chain.
pub fn chain(from: BlockNum, to: BlockNum) -> Vec<Block> {
    (from..=to).map(scripted_block).collect()
}

pub fn run_config(start_block: BlockNum, block_count: u64) -> RunConfig {
    RunConfig {
        start_block,
        block_count,
        checkpoint_interval: None,
    }
}

/// Object stores and node shared by the pipelines of one scenario.
pub struct Fixture {
    pub state_io: Arc<dyn ObjectStore>,
    pub cache_io: Arc<dyn ObjectStore>,
    pub node: ScriptedNode,
    pub hub_config: HubConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            state_io: Arc::new(InMemoryObjectStore::new()),
            cache_io: Arc::new(InMemoryObjectStore::new()),
            node: ScriptedNode::default(),
            hub_config: HubConfig {
                queue_capacity: 100_000,
                send_timeout: Duration::from_millis(100),
            },
        }
    }

    /// Fresh pipeline (and hub) over this fixture's storage.
    pub fn pipeline(&self, run: RunConfig) -> Pipeline<ScriptedNode> {
        let cache = CallCache::new(self.cache_io.clone(), 0, 999).unwrap();
        let caller = Arc::new(CachedCaller::new(self.node.clone(), Arc::new(cache)));
        let stores = StoreRegistry::new(self.state_io.clone()).unwrap();
        let hub = Arc::new(SubscriptionHub::with_config(self.hub_config.clone()));
        Pipeline::new(run, stores, hub, caller, Some(FACTORY.to_string())).unwrap()
    }
}

/// Feed `blocks` from the pipeline's start height.
pub async fn drive(pipeline: &mut Pipeline<ScriptedNode>, blocks: Vec<Block>) -> StreamEnd {
    let start = pipeline.run_config().start_block;
    IterBlockSource::new(blocks, start).run(pipeline).await.unwrap()
}

/// Prepare, then run `blocks` to the end of the stream.
pub async fn run_to_end(fixture: &Fixture, run: RunConfig, blocks: Vec<Block>) -> Snapshot {
    let mut pipeline = fixture.pipeline(run);
    pipeline.prepare().await.unwrap();
    let end = drive(&mut pipeline, blocks).await;
    assert!(matches!(end, StreamEnd::EndOfStream { .. }), "{end:?}");
    snapshot(pipeline.stores())
}

pub fn snapshot(stores: &StoreRegistry) -> Snapshot {
    stores
        .iter()
        .map(|store| {
            let entries = store
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_vec()))
                .collect();
            (store.name().to_string(), entries)
        })
        .collect()
}

/// Everything queued for `subscriber` until the hub closes.
pub async fn collect(subscriber: &mut Subscriber) -> Vec<Delta> {
    let mut deltas = Vec::new();
    while let Ok(delta) = tokio::time::timeout(Duration::from_secs(5), subscriber.next())
        .await
        .expect("subscriber stalled")
    {
        deltas.push(delta);
    }
    deltas
}
