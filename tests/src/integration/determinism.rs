//! Same input, same state and checkpoint bytes; the delta stream alone
//! rebuilds the state.

use super::fixtures::{
    chain, collect, drive, run_config, run_to_end, scripted_block, snapshot, Fixture, Snapshot,
};
use pipeline_runtime::RunConfig;
use shared_store::{InMemoryObjectStore, ObjectStore};
use shared_types::Delta;
use std::collections::BTreeMap;
use std::sync::Arc;
use sx_01_state_store::{Store, StoreReader};
use sx_03_exchange::domain::keys;
use sx_03_exchange::stores;

#[tokio::test]
async fn test_same_blocks_same_state() {
    let first = run_to_end(&Fixture::new(), run_config(0, 50), chain(0, 50)).await;
    let second = run_to_end(&Fixture::new(), run_config(0, 50), chain(0, 50)).await;

    assert_eq!(first, second);
    for name in stores::ALL {
        assert!(!first[name].is_empty(), "store {name} is empty");
    }
}

/// Every checkpoint object, name and bytes.
async fn checkpoints(fixture: &Fixture) -> BTreeMap<String, Vec<u8>> {
    let mut objects = BTreeMap::new();
    for name in fixture.state_io.list_objects("state-").await.unwrap() {
        let bytes = fixture.state_io.read_object(&name).await.unwrap();
        objects.insert(name, bytes);
    }
    objects
}

fn every_ten(start_block: u64, block_count: u64) -> RunConfig {
    RunConfig {
        start_block,
        block_count,
        checkpoint_interval: Some(10),
    }
}

#[tokio::test]
async fn test_same_blocks_same_checkpoint_bytes() {
    let first = Fixture::new();
    run_to_end(&first, every_ten(0, 40), chain(0, 40)).await;
    let second = Fixture::new();
    run_to_end(&second, every_ten(0, 40), chain(0, 40)).await;

    let written = checkpoints(&first).await;
    // Heights 10, 20, 30 and 40 for each store; 40 is written twice
    assert_eq!(written.len(), 4 * stores::ALL.len());
    assert_eq!(written, checkpoints(&second).await);
}

#[tokio::test]
async fn test_resumed_run_writes_same_checkpoint_bytes() {
    let full = Fixture::new();
    run_to_end(&full, every_ten(0, 40), chain(0, 40)).await;

    // Stops at 25, resumes there, with a different periodic phase
    let resumed = Fixture::new();
    run_to_end(&resumed, every_ten(0, 25), chain(0, 25)).await;
    run_to_end(&resumed, every_ten(25, 15), chain(25, 40)).await;

    // Full run: 10, 20, 30, 40. Resumed: 10, 20, 25, 35, 40
    let expected = checkpoints(&full).await;
    let written = checkpoints(&resumed).await;
    let mut shared = 0;
    for (name, bytes) in &written {
        if let Some(original) = expected.get(name) {
            assert_eq!(bytes, original, "{name}");
            shared += 1;
        }
    }
    assert_eq!(shared, 3 * stores::ALL.len());
}

#[tokio::test]
async fn test_exchange_state_after_fifty_blocks() {
    let fixture = Fixture::new();
    let mut pipeline = fixture.pipeline(run_config(0, 50));
    drive(&mut pipeline, chain(0, 50)).await;
    let stores = pipeline.stores();

    // Pairs created at 0, 7, ..., 49; foreign factory ignored
    assert_eq!(stores.total_pairs.get_str(keys::TOTAL_PAIRS), Some("8"));
    assert!(stores.pairs.has("pair:0xpair49"));
    assert!(!stores.pairs.has("pair:0xforeign0"));
    assert!(stores.pairs.has("token:0xtok0a"));

    // Only the current and previous day buckets survive
    let today = keys::day_of(scripted_block(49).timestamp);
    let days: Vec<u64> = stores
        .volume24h
        .iter()
        .filter_map(|(key, _)| keys::volume_day(key))
        .collect();
    assert!(!days.is_empty());
    assert!(days.iter().all(|day| day + 1 >= today), "{days:?}");
}

#[tokio::test]
async fn test_delta_replay_rebuilds_state() {
    let fixture = Fixture::new();
    let mut pipeline = fixture.pipeline(run_config(0, 40));
    let mut subscriber = pipeline.hub().new_subscriber();
    for topic in stores::ALL {
        pipeline.hub().subscribe(&subscriber, topic).unwrap();
    }

    drive(&mut pipeline, chain(0, 40)).await;
    let expected = snapshot(pipeline.stores());

    let mut by_store: BTreeMap<String, Vec<Delta>> = BTreeMap::new();
    for delta in collect(&mut subscriber).await {
        by_store.entry(delta.store.clone()).or_default().push(delta);
    }

    let io = Arc::new(InMemoryObjectStore::new());
    let mut replayed = Snapshot::new();
    for name in stores::ALL {
        let mut store = Store::new(name, io.clone()).unwrap();
        store
            .apply_deltas(by_store.get(name).map(Vec::as_slice).unwrap_or_default())
            .unwrap();
        let entries = store
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_vec()))
            .collect();
        replayed.insert(name.to_string(), entries);
    }

    assert_eq!(replayed, expected);
}
