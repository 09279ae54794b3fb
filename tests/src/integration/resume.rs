//! Resuming from stored state matches processing from genesis.

use super::fixtures::{chain, drive, run_config, run_to_end, snapshot, Fixture};
use pipeline_runtime::{PipelineError, RunConfig, StreamEnd};
use shared_store::ObjectStore;
use sx_01_state_store::LoadError;

async fn from_genesis(to: u64) -> super::fixtures::Snapshot {
    run_to_end(&Fixture::new(), run_config(0, to), chain(0, to)).await
}

#[tokio::test]
async fn test_resume_from_final_checkpoint() {
    let expected = from_genesis(40).await;

    let fixture = Fixture::new();
    run_to_end(&fixture, run_config(0, 17), chain(0, 17)).await;
    let resumed = run_to_end(&fixture, run_config(17, 23), chain(17, 40)).await;

    assert_eq!(resumed, expected);
}

#[tokio::test]
async fn test_resume_replays_segments_after_periodic_checkpoint() {
    let expected = from_genesis(40).await;

    let fixture = Fixture::new();
    let periodic = RunConfig {
        start_block: 0,
        block_count: 40,
        checkpoint_interval: Some(10),
    };
    run_to_end(&fixture, periodic, chain(0, 40)).await;

    // Highest checkpoint <= 23 is 20; blocks 20..23 come from segments
    let mut pipeline = fixture.pipeline(run_config(23, 17));
    pipeline.prepare().await.unwrap();
    for store in pipeline.stores().iter() {
        assert_eq!(store.last_checkpoint(), Some(20), "{}", store.name());
    }

    let end = drive(&mut pipeline, chain(23, 40)).await;
    assert_eq!(end, StreamEnd::EndOfStream { at: 40 });
    assert_eq!(snapshot(pipeline.stores()), expected);
}

#[tokio::test]
async fn test_resume_after_source_ran_dry() {
    let expected = from_genesis(40).await;

    let fixture = Fixture::new();
    let mut pipeline = fixture.pipeline(run_config(0, 100));
    let end = drive(&mut pipeline, chain(0, 29)).await;
    assert_eq!(end, StreamEnd::Exhausted { last: Some(29) });
    pipeline.finish().await.unwrap();

    let resumed = run_to_end(&fixture, run_config(30, 10), chain(30, 40)).await;
    assert_eq!(resumed, expected);
}

#[tokio::test]
async fn test_corrupted_checkpoint_refuses_to_load() {
    let fixture = Fixture::new();
    run_to_end(&fixture, run_config(0, 17), chain(0, 17)).await;
    fixture
        .state_io
        .write_object("state-prices-0000000017.kv", b"SXKV garbage".to_vec())
        .await
        .unwrap();

    let mut pipeline = fixture.pipeline(run_config(17, 5));
    let err = pipeline.prepare().await.unwrap_err();
    assert!(
        matches!(err, PipelineError::Load(LoadError::Corrupted { .. })),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_resume_without_state_fails() {
    let fixture = Fixture::new();
    let mut pipeline = fixture.pipeline(run_config(10, 5));
    let err = pipeline.prepare().await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Load(LoadError::NoCheckpoint { target: 10, .. })
    ));
}

#[tokio::test]
async fn test_resume_past_processed_blocks_fails() {
    let fixture = Fixture::new();
    run_to_end(&fixture, run_config(0, 17), chain(0, 17)).await;

    // Blocks 17..30 were never seen
    let mut pipeline = fixture.pipeline(run_config(30, 5));
    let err = pipeline.prepare().await.unwrap_err();
    assert!(
        matches!(
            err,
            PipelineError::Load(LoadError::NotProcessed {
                processed: 17,
                target: 30,
                ..
            })
        ),
        "{err:?}"
    );
}
