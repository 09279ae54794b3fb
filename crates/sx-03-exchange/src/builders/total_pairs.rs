use crate::domain::entities::Swaps;
use crate::domain::errors::StateBuildError;
use crate::domain::keys;
use sx_01_state_store::Store;

/// Running totals in `total_pairs`: pair count, swap count, swaps per pair.
#[derive(Debug, Default, Clone, Copy)]
pub struct TotalPairsStateBuilder;

impl TotalPairsStateBuilder {
    pub fn build(&self, created_pairs: usize, swaps: &Swaps, store: &mut Store) -> Result<(), StateBuildError> {
        if created_pairs > 0 {
            store.sum_i64(keys::TOTAL_PAIRS, count(created_pairs))?;
        }
        if swaps.is_empty() {
            return Ok(());
        }
        store.sum_i64(keys::TOTAL_SWAPS, count(swaps.len()))?;
        for swap in swaps.iter() {
            store.sum_i64(&keys::pair_swaps(&swap.pair), 1)?;
        }
        Ok(())
    }
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
