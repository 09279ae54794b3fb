use super::encode;
use crate::domain::entities::Reserves;
use crate::domain::errors::StateBuildError;
use crate::domain::keys::{self, Side};
use sx_01_state_store::{Store, StoreReader};

/// Writes `reserves:<pair>` and both `price:<pair>:*` keys into `prices`.
///
/// Prices are left as they were while either side of the pool is empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct PricesStateBuilder;

impl PricesStateBuilder {
    pub fn build(
        &self,
        reserves: &Reserves,
        pairs: &dyn StoreReader,
        store: &mut Store,
    ) -> Result<(), StateBuildError> {
        for update in reserves.iter() {
            if !pairs.has(&keys::pair(&update.pair)) {
                return Err(StateBuildError::UnknownPair {
                    pair: update.pair.clone(),
                    block: update.block_number,
                });
            }

            let key = keys::reserves(&update.pair);
            let value = encode(&key, update)?;
            store.set(key, value);

            if let Some((price0, price1)) = update.prices() {
                store.set(
                    keys::price(&update.pair, Side::Token0),
                    price0.to_string().into_bytes(),
                );
                store.set(
                    keys::price(&update.pair, Side::Token1),
                    price1.to_string().into_bytes(),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::fixtures;
    use crate::domain::entities::ReserveUpdate;

    fn update(pair: &str, normalized0: f64, normalized1: f64) -> ReserveUpdate {
        ReserveUpdate {
            pair: pair.into(),
            reserve0: 0,
            reserve1: 0,
            normalized0,
            normalized1,
            block_number: 4,
        }
    }

    fn pairs_with(address: &str) -> Store {
        let mut pairs = fixtures::store("pairs");
        pairs.set(
            keys::pair(address),
            serde_json::to_vec(&fixtures::pair(address)).unwrap(),
        );
        pairs
    }

    #[test]
    fn test_writes_reserves_and_prices() {
        let pairs = pairs_with("0xp");
        let mut prices = fixtures::store("prices");
        PricesStateBuilder
            .build(&Reserves(vec![update("0xp", 4.0, 2.0)]), &pairs, &mut prices)
            .unwrap();

        assert_eq!(prices.get_str("price:0xp:token0"), Some("0.5"));
        assert_eq!(prices.get_str("price:0xp:token1"), Some("2"));
        assert!(prices.has("reserves:0xp"));
        assert_eq!(prices.deltas().len(), 3);
    }

    #[test]
    fn test_empty_pool_keeps_prices() {
        let pairs = pairs_with("0xp");
        let mut prices = fixtures::store("prices");
        PricesStateBuilder
            .build(&Reserves(vec![update("0xp", 0.0, 2.0)]), &pairs, &mut prices)
            .unwrap();
        assert!(!prices.has("price:0xp:token0"));
        assert_eq!(prices.deltas().len(), 1);
    }

    #[test]
    fn test_unknown_pair_fails() {
        let pairs = fixtures::store("pairs");
        let mut prices = fixtures::store("prices");
        let err = PricesStateBuilder
            .build(&Reserves(vec![update("0xp", 1.0, 1.0)]), &pairs, &mut prices)
            .unwrap_err();
        assert!(matches!(err, StateBuildError::UnknownPair { block: 4, .. }));
    }
}
