//! # sx-pipeline
//!
//! Runs the exchange pipeline over a newline-delimited JSON block file.
//!
//! ```text
//! sx-pipeline 1000 --start-block 0 --blocks-file ./blocks.jsonl
//! ```
//!
//! Stored state is resumed when `--start-block` is above genesis; the final
//! checkpoint of one run is the starting point of the next.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use pipeline_runtime::{
    spawn_pair_printer, BlockSource, CacheConfig, ExchangeConfig, HubSettings, JsonlBlockSource,
    OfflineCallClient, Pipeline, PipelineConfig, RunConfig, StorageConfig, StoreRegistry,
    StreamEnd,
};
use shared_bus::{SubscriptionHub, DEFAULT_CHANNEL_CAPACITY, DEFAULT_SEND_TIMEOUT_MS};
use shared_store::open_store;
use sx_02_call_cache::{CachedCaller, CallCache};
use sx_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};

/// Exchange state pipeline
#[derive(Parser, Debug)]
#[command(name = "sx-pipeline", version)]
#[command(about = "Builds exchange pair, price and volume state from a block stream")]
struct Args {
    /// Number of blocks to process
    #[arg(env = "SX_BLOCK_COUNT", default_value_t = 1000)]
    block_count: u64,

    /// First block to process
    #[arg(long, env = "SX_START_BLOCK", default_value_t = 0)]
    start_block: u64,

    /// Newline-delimited JSON block file
    #[arg(long, env = "SX_BLOCKS_FILE", default_value = "./blocks.jsonl")]
    blocks_file: PathBuf,

    /// Object store for checkpoints and delta segments
    #[arg(long, env = "SX_STATE_STORE_URL", default_value = "file://./localdata")]
    state_store_url: String,

    /// Object store for the call cache
    #[arg(long, env = "SX_CACHE_STORE_URL", default_value = "file://./rpc-cache")]
    cache_store_url: String,

    /// Call cache validity window, START-END
    #[arg(long, env = "SX_CACHE_RANGE", default_value = "0-999")]
    cache_range: String,

    /// Write checkpoints every N blocks
    #[arg(long, env = "SX_CHECKPOINT_INTERVAL")]
    checkpoint_interval: Option<u64>,

    /// Deltas buffered per subscriber
    #[arg(long, env = "SX_QUEUE_CAPACITY", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    queue_capacity: usize,

    /// How long a broadcast waits on a full subscriber queue
    #[arg(long, env = "SX_SEND_TIMEOUT_MS", default_value_t = DEFAULT_SEND_TIMEOUT_MS)]
    send_timeout_ms: u64,

    /// Only track pairs created by this factory
    #[arg(long, env = "SX_FACTORY")]
    factory: Option<String>,

    /// Node endpoint for contract calls
    #[arg(long, env = "SX_RPC_ENDPOINT", default_value = "http://localhost:8546")]
    rpc_endpoint: String,

    /// Do not log pair updates
    #[arg(long)]
    no_print_pairs: bool,
}

impl Args {
    fn into_config(self) -> Result<PipelineConfig> {
        let cache = CacheConfig::parse_range(&self.cache_range)?;
        Ok(PipelineConfig {
            run: RunConfig {
                start_block: self.start_block,
                block_count: self.block_count,
                checkpoint_interval: self.checkpoint_interval,
            },
            storage: StorageConfig {
                blocks_file: self.blocks_file,
                state_store_url: self.state_store_url,
                cache_store_url: self.cache_store_url,
            },
            hub: HubSettings {
                queue_capacity: self.queue_capacity,
                send_timeout_ms: self.send_timeout_ms,
            },
            cache,
            exchange: ExchangeConfig {
                factory: self.factory,
                rpc_endpoint: self.rpc_endpoint,
                print_pairs: !self.no_print_pairs,
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).context("Failed to initialize telemetry")?;
    info!(service = %telemetry.service_name, "Starting exchange pipeline");

    let config = args.into_config()?;
    config.validate().context("Invalid configuration")?;

    let result = run(config).await;
    dump_metrics();
    result
}

async fn run(config: PipelineConfig) -> Result<()> {
    let state_io = open_store(&config.storage.state_store_url)
        .with_context(|| format!("Cannot open state store {}", config.storage.state_store_url))?;
    let cache_io = open_store(&config.storage.cache_store_url)
        .with_context(|| format!("Cannot open cache store {}", config.storage.cache_store_url))?;
    info!(
        state = %state_io.describe(),
        cache = %cache_io.describe(),
        "Storage ready"
    );

    let cache = CallCache::new(cache_io, config.cache.start, config.cache.end)?;
    let client = OfflineCallClient::new(config.exchange.rpc_endpoint.clone());
    info!(endpoint = %client.endpoint(), "Contract calls served from cache only");
    let caller = Arc::new(CachedCaller::new(client, Arc::new(cache)));

    let stores = StoreRegistry::new(state_io)?;
    let hub = Arc::new(SubscriptionHub::with_config(config.hub.to_hub_config()));
    let mut pipeline = Pipeline::new(
        config.run.clone(),
        stores,
        hub.clone(),
        caller,
        config.exchange.factory.clone(),
    )
    .context("Failed to register topics")?;

    let printer = if config.exchange.print_pairs {
        Some(spawn_pair_printer(&hub).context("Failed to start pair printer")?)
    } else {
        None
    };

    pipeline.prepare().await.context("Failed to prepare stores")?;

    let mut source = JsonlBlockSource::new(&config.storage.blocks_file, config.run.start_block);
    match source.run(&mut pipeline).await {
        Ok(StreamEnd::EndOfStream { at }) => info!(block = at, "Run complete"),
        Ok(StreamEnd::Exhausted { last }) => {
            warn!(
                last = ?last,
                stop = config.run.stop_block(),
                "Block file ended before the stop block"
            );
            pipeline.finish().await.context("Failed to write final state")?;
        }
        Err(e) => {
            hub.close();
            return Err(e).context("Pipeline halted");
        }
    }

    if let Some(printer) = printer {
        let printed = printer.await.context("Pair printer task failed")?;
        info!(printed, "Pair printer finished");
    }

    let stats = hub.stats();
    info!(
        topics = stats.topics,
        deltas = stats.deltas_broadcast,
        deliveries = stats.deliveries,
        "Hub totals"
    );
    Ok(())
}

fn dump_metrics() {
    match encode_metrics() {
        Ok(text) => debug!("Final metrics:\n{text}"),
        Err(e) => warn!(error = %e, "Cannot encode metrics"),
    }
}
