//! Hub delivery as seen by consumers of a running pipeline.

use super::fixtures::{chain, collect, drive, run_config, scripted_block, Fixture};
use pipeline_runtime::{spawn_pair_printer, HandlerOutcome};
use shared_store::ObjectStore;
use shared_types::{Delta, Operation};
use std::collections::HashSet;
use std::time::Duration;
use sx_01_state_store::DeltaSegment;
use sx_03_exchange::stores;

#[tokio::test]
async fn test_new_pair_reaches_only_earlier_subscribers() {
    let fixture = Fixture::new();
    let mut pipeline = fixture.pipeline(run_config(0, 5));
    let hub = pipeline.hub().clone();

    let mut early = hub.new_subscriber();
    hub.subscribe(&early, stores::PAIRS).unwrap();

    // Block 0 creates the only tracked pair of this run
    let outcome = pipeline.handle_block(&scripted_block(0)).await.unwrap();
    assert_eq!(outcome, HandlerOutcome::Continue);

    let mut late = hub.new_subscriber();
    hub.subscribe(&late, stores::PAIRS).unwrap();
    drive(&mut pipeline, chain(1, 5)).await;

    let early_deltas = collect(&mut early).await;
    let pair_deltas: Vec<&Delta> = early_deltas
        .iter()
        .filter(|d| d.key.starts_with("pair:"))
        .collect();
    assert_eq!(pair_deltas.len(), 1);
    assert_eq!(pair_deltas[0].key, "pair:0xpair0");
    assert_eq!(pair_deltas[0].operation, Operation::Create);
    assert_eq!(pair_deltas[0].block_number, 0);

    assert!(collect(&mut late).await.is_empty());
}

#[tokio::test]
async fn test_topic_order_matches_persisted_segments() {
    let fixture = Fixture::new();
    let mut pipeline = fixture.pipeline(run_config(0, 30));
    let hub = pipeline.hub().clone();
    let mut first = hub.new_subscriber();
    let mut second = hub.new_subscriber();
    hub.subscribe(&first, stores::PRICES).unwrap();
    hub.subscribe(&second, stores::PRICES).unwrap();

    drive(&mut pipeline, chain(0, 30)).await;
    let received = collect(&mut first).await;
    assert_eq!(collect(&mut second).await, received);

    let mut persisted = Vec::new();
    for name in fixture.state_io.list_objects("deltas-prices-").await.unwrap() {
        let bytes = fixture.state_io.read_object(&name).await.unwrap();
        persisted.extend(DeltaSegment::decode(&bytes).unwrap().deltas);
    }
    assert!(!persisted.is_empty());
    assert_eq!(received, persisted);

    // One price/reserves write per key per block
    let mut seen = HashSet::new();
    for delta in &received {
        assert!(
            seen.insert((delta.key.clone(), delta.block_number)),
            "delivered twice: {delta:?}"
        );
    }
    assert!(received.windows(2).all(|w| w[0].block_number <= w[1].block_number));
}

#[tokio::test]
async fn test_topics_are_isolated() {
    let fixture = Fixture::new();
    let mut pipeline = fixture.pipeline(run_config(0, 20));
    let hub = pipeline.hub().clone();
    let mut volume = hub.new_subscriber();
    hub.subscribe(&volume, stores::VOLUME_24H).unwrap();

    drive(&mut pipeline, chain(0, 20)).await;
    let deltas = collect(&mut volume).await;
    assert!(!deltas.is_empty());
    assert!(deltas.iter().all(|d| d.store == stores::VOLUME_24H));
}

#[tokio::test]
async fn test_pair_printer_sees_every_pair() {
    let fixture = Fixture::new();
    let mut pipeline = fixture.pipeline(run_config(0, 30));
    let printer = spawn_pair_printer(pipeline.hub()).unwrap();

    drive(&mut pipeline, chain(0, 30)).await;

    // Pairs created at 0, 7, 14, 21 and 28
    let printed = tokio::time::timeout(Duration::from_secs(5), printer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(printed, 5);
}
