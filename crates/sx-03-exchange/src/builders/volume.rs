use crate::domain::entities::Swaps;
use crate::domain::errors::StateBuildError;
use crate::domain::keys::{self, Side};
use std::collections::BTreeSet;
use sx_01_state_store::{Store, StoreReader};

/// Daily traded volume per pair in `volume24h`.
///
/// Keeps the current and the previous day; older buckets are deleted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Volume24hStateBuilder;

impl Volume24hStateBuilder {
    pub fn build(&self, timestamp: u64, swaps: &Swaps, store: &mut Store) -> Result<(), StateBuildError> {
        for swap in swaps.iter() {
            let day = keys::day_of(swap.timestamp);
            store.sum_f64(&keys::volume(day, &swap.pair, Side::Token0), swap.volume0)?;
            store.sum_f64(&keys::volume(day, &swap.pair, Side::Token1), swap.volume1)?;
        }

        let today = keys::day_of(timestamp);
        let stale: BTreeSet<u64> = store
            .scan_prefix(keys::VOLUME_PREFIX)
            .filter_map(|(key, _)| keys::volume_day(key))
            .filter(|day| day.saturating_add(1) < today)
            .collect();
        for day in stale {
            store.delete_prefix(&keys::volume_day_prefix(day));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::fixtures;
    use crate::domain::entities::Swap;
    use shared_types::Operation;

    const DAY: u64 = 86_400;

    fn swap(pair: &str, timestamp: u64, volume0: f64) -> Swap {
        Swap {
            pair: pair.into(),
            sender: String::new(),
            to: String::new(),
            amount0_in: 0,
            amount1_in: 0,
            amount0_out: 0,
            amount1_out: 0,
            volume0,
            volume1: 2.0 * volume0,
            token0_price: None,
            block_number: 1,
            timestamp,
        }
    }

    #[test]
    fn test_volume_accumulates_per_day() {
        let mut store = fixtures::store("volume24h");
        let t = 10 * DAY + 5;
        Volume24hStateBuilder
            .build(t, &Swaps(vec![swap("0xp", t, 1.5), swap("0xp", t, 0.5)]), &mut store)
            .unwrap();

        assert_eq!(store.get_str("volume:10:0xp:token0"), Some("2"));
        assert_eq!(store.get_str("volume:10:0xp:token1"), Some("4"));
    }

    #[test]
    fn test_buckets_older_than_previous_day_are_deleted() {
        let mut store = fixtures::store("volume24h");
        let builder = Volume24hStateBuilder;
        builder
            .build(8 * DAY, &Swaps(vec![swap("0xp", 8 * DAY, 1.0)]), &mut store)
            .unwrap();
        builder
            .build(9 * DAY, &Swaps(vec![swap("0xp", 9 * DAY, 1.0)]), &mut store)
            .unwrap();
        store.flush();

        // Day 10: day 9 is the previous day and stays, day 8 goes
        builder.build(10 * DAY, &Swaps::default(), &mut store).unwrap();

        assert!(!store.has("volume:8:0xp:token0"));
        assert!(store.has("volume:9:0xp:token0"));
        assert_eq!(store.deltas().len(), 2);
        assert!(store.deltas().iter().all(|d| d.operation == Operation::Delete));
    }
}
