//! Pair update printer: a consumer task on the `pairs` topic.

use shared_bus::{HubError, SubscriptionHub};
use shared_types::Delta;
use sx_03_exchange::stores;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Prefix of the delta keys the printer reports.
pub const PAIR_KEY_PREFIX: &str = "pair";

/// Subscribe to `pairs` and log every delta whose key starts with `pair`.
///
/// Must be called before the first block so no update is missed. The task
/// ends when the hub closes and yields the number of deltas it printed.
pub fn spawn_pair_printer(hub: &SubscriptionHub) -> Result<JoinHandle<usize>, HubError> {
    let mut subscriber = hub.new_subscriber();
    hub.subscribe(&subscriber, stores::PAIRS)?;

    Ok(tokio::spawn(async move {
        let mut printed = 0;
        loop {
            match subscriber.next().await {
                Ok(delta) if delta.key.starts_with(PAIR_KEY_PREFIX) => {
                    print_delta(&delta);
                    printed += 1;
                }
                Ok(_) => {}
                Err(HubError::Closed) => break,
                Err(e) => {
                    warn!(error = %e, "Pair printer stopped");
                    break;
                }
            }
        }
        printed
    }))
}

fn print_delta(delta: &Delta) {
    let value = delta
        .new_value
        .as_deref()
        .map(String::from_utf8_lossy)
        .unwrap_or_default();
    info!(
        block = delta.block_number,
        operation = %delta.operation,
        key = %delta.key,
        "Pair update: {value}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_prints_only_pair_keys() {
        let hub = SubscriptionHub::new();
        hub.register_topic(stores::PAIRS).unwrap();
        let printer = spawn_pair_printer(&hub).unwrap();

        let deltas = vec![
            Delta::create("pairs", "pair:0xp", b"{}".to_vec(), 1),
            Delta::create("pairs", "token:0xa", b"{}".to_vec(), 1),
        ];
        hub.broadcast_deltas(stores::PAIRS, &deltas).await.unwrap();
        hub.close();

        let printed = tokio::time::timeout(Duration::from_secs(1), printer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(printed, 1);
    }

    #[test]
    fn test_requires_pairs_topic() {
        let hub = SubscriptionHub::new();
        assert!(matches!(
            spawn_pair_printer(&hub),
            Err(HubError::UnknownTopic { .. })
        ));
    }
}
