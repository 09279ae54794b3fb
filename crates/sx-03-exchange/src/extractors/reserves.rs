use super::load_pair;
use crate::domain::entities::{ReserveUpdate, Reserves};
use crate::domain::errors::ExtractionError;
use crate::domain::events::{ExchangeBlock, ExchangeEvent};
use std::collections::HashMap;
use sx_01_state_store::StoreReader;

/// Extracts the last reserves of each known pair from `Sync` events.
///
/// Reads the `pairs` store for token decimals; syncs of pairs it does not
/// know are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReservesExtractor;

impl ReservesExtractor {
    pub fn extract(&self, block: &ExchangeBlock, pairs: &dyn StoreReader) -> Result<Reserves, ExtractionError> {
        let mut updates: Vec<ReserveUpdate> = Vec::new();
        // pair -> position in `updates`, so a later sync replaces an earlier one
        let mut seen: HashMap<String, usize> = HashMap::new();

        for event in &block.events {
            let ExchangeEvent::Sync {
                pair,
                reserve0,
                reserve1,
            } = event
            else {
                continue;
            };

            let address = pair.to_ascii_lowercase();
            let Some(stored) = load_pair(pairs, &address)? else {
                continue;
            };

            let update = ReserveUpdate {
                normalized0: stored.token0.normalize(*reserve0),
                normalized1: stored.token1.normalize(*reserve1),
                pair: address,
                reserve0: *reserve0,
                reserve1: *reserve1,
                block_number: block.number,
            };
            match seen.get(&update.pair) {
                Some(&at) => updates[at] = update,
                None => {
                    seen.insert(update.pair.clone(), updates.len());
                    updates.push(update);
                }
            }
        }

        Ok(Reserves(updates))
    }
}
