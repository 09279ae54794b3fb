use super::load_pair;
use crate::domain::entities::{Swap, Swaps};
use crate::domain::errors::ExtractionError;
use crate::domain::events::{ExchangeBlock, ExchangeEvent};
use crate::domain::keys::{self, Side};
use sx_01_state_store::StoreReader;

/// Extracts swaps on known pairs.
///
/// Reads `pairs` for decimals and `prices` for the token0 price as of the
/// current block.
#[derive(Debug, Default, Clone, Copy)]
pub struct SwapsExtractor;

impl SwapsExtractor {
    pub fn extract(
        &self,
        block: &ExchangeBlock,
        pairs: &dyn StoreReader,
        prices: &dyn StoreReader,
    ) -> Result<Swaps, ExtractionError> {
        let mut swaps = Vec::new();

        for event in &block.events {
            let ExchangeEvent::Swap {
                pair,
                sender,
                to,
                amount0_in,
                amount1_in,
                amount0_out,
                amount1_out,
            } = event
            else {
                continue;
            };

            let address = pair.to_ascii_lowercase();
            let Some(stored) = load_pair(pairs, &address)? else {
                continue;
            };

            let token0_price = prices
                .get_str(&keys::price(&address, Side::Token0))
                .and_then(|p| p.parse::<f64>().ok());

            swaps.push(Swap {
                volume0: stored.token0.normalize(amount0_in.saturating_add(*amount0_out)),
                volume1: stored.token1.normalize(amount1_in.saturating_add(*amount1_out)),
                pair: address,
                sender: sender.to_ascii_lowercase(),
                to: to.to_ascii_lowercase(),
                amount0_in: *amount0_in,
                amount1_in: *amount1_in,
                amount0_out: *amount0_out,
                amount1_out: *amount1_out,
                token0_price,
                block_number: block.number,
                timestamp: block.timestamp,
            });
        }

        Ok(Swaps(swaps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Pair, Token};
    use shared_store::InMemoryObjectStore;
    use std::sync::Arc;
    use sx_01_state_store::Store;

    fn stores() -> (Store, Store) {
        let io = Arc::new(InMemoryObjectStore::new());
        let mut pairs = Store::new("pairs", io.clone()).unwrap();
        let pair = Pair {
            address: "0xp".into(),
            factory: "0xf".into(),
            token0: Token {
                address: "0xa".into(),
                decimals: 2,
            },
            token1: Token {
                address: "0xb".into(),
                decimals: 0,
            },
            created_at_block: 1,
            created_at_timestamp: 0,
        };
        pairs.set(keys::pair("0xp"), serde_json::to_vec(&pair).unwrap());

        let mut prices = Store::new("prices", io).unwrap();
        prices.set(keys::price("0xp", Side::Token0), b"2.5".to_vec());
        (pairs, prices)
    }

    fn swap(pair: &str) -> ExchangeEvent {
        ExchangeEvent::Swap {
            pair: pair.into(),
            sender: "0xS".into(),
            to: "0xT".into(),
            amount0_in: 150,
            amount1_in: 0,
            amount0_out: 0,
            amount1_out: 4,
        }
    }

    #[test]
    fn test_swap_volumes_and_price() {
        let (pairs, prices) = stores();
        let block = ExchangeBlock {
            number: 8,
            id: "0x8".into(),
            timestamp: 172_800,
            events: vec![swap("0xp"), swap("0xother")],
        };

        let swaps = SwapsExtractor.extract(&block, &pairs, &prices).unwrap();
        assert_eq!(swaps.len(), 1);
        let s = &swaps.0[0];
        assert_eq!(s.volume0, 1.5);
        assert_eq!(s.volume1, 4.0);
        assert_eq!(s.token0_price, Some(2.5));
        assert_eq!(s.sender, "0xs");
        assert_eq!(s.timestamp, 172_800);
    }

    #[test]
    fn test_missing_price_is_none() {
        let (pairs, _) = stores();
        let empty = Store::new("prices", Arc::new(InMemoryObjectStore::new())).unwrap();
        let block = ExchangeBlock {
            number: 8,
            id: "0x8".into(),
            timestamp: 0,
            events: vec![swap("0xp")],
        };
        let swaps = SwapsExtractor.extract(&block, &pairs, &empty).unwrap();
        assert_eq!(swaps.0[0].token0_price, None);
    }
}
