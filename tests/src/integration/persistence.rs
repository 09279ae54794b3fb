//! Durable artifacts: checkpoints, the call cache, and a local directory
//! object store.

use super::fixtures::{chain, run_config, run_to_end, scripted_block, Fixture};
use pipeline_runtime::StoreRegistry;
use shared_store::{open_store, ObjectStore};
use sx_01_state_store::checkpoint_name;
use sx_02_call_cache::CallCache;
use sx_03_exchange::stores;

#[tokio::test]
async fn test_rewriting_a_checkpoint_is_idempotent() {
    let fixture = Fixture::new();
    run_to_end(&fixture, run_config(0, 20), chain(0, 20)).await;

    let mut before = Vec::new();
    for name in stores::ALL {
        let artifact = checkpoint_name(name, 20);
        before.push(fixture.state_io.read_object(&artifact).await.unwrap());
    }

    // Load the final state and write it again under the same block
    let mut registry = StoreRegistry::new(fixture.state_io.clone()).unwrap();
    registry.init_all(20).await.unwrap();
    registry
        .write_state_all(&scripted_block(20).block_ref())
        .await
        .unwrap();

    for (name, original) in stores::ALL.iter().zip(before) {
        let artifact = checkpoint_name(name, 20);
        let rewritten = fixture.state_io.read_object(&artifact).await.unwrap();
        assert_eq!(rewritten, original, "{artifact}");
    }
}

#[tokio::test]
async fn test_call_cache_survives_between_runs() {
    let first = Fixture::new();
    let expected = run_to_end(&first, run_config(0, 30), chain(0, 30)).await;
    // Five pairs, two tokens each
    assert_eq!(first.node.calls(), 10);

    let loaded = CallCache::new(first.cache_io.clone(), 0, 999).unwrap();
    assert_eq!(loaded.load().await.unwrap(), 10);

    // Fresh state, same cache: the node is never asked again
    let second = Fixture {
        cache_io: first.cache_io.clone(),
        ..Fixture::new()
    };
    let replayed = run_to_end(&second, run_config(0, 30), chain(0, 30)).await;
    assert_eq!(second.node.calls(), 0);
    assert_eq!(replayed, expected);
}

#[tokio::test]
async fn test_local_directory_store_resume() {
    let expected = run_to_end(&Fixture::new(), run_config(0, 30), chain(0, 30)).await;

    let dir = tempfile::tempdir().unwrap();
    let url = format!("file://{}", dir.path().display());
    let fixture = Fixture {
        state_io: open_store(&url).unwrap(),
        ..Fixture::new()
    };

    run_to_end(&fixture, run_config(0, 12), chain(0, 12)).await;
    let resumed = run_to_end(&fixture, run_config(12, 18), chain(12, 30)).await;
    assert_eq!(resumed, expected);

    let listed = fixture.state_io.list_objects("state-pairs-").await.unwrap();
    assert_eq!(listed.len(), 2);
}
