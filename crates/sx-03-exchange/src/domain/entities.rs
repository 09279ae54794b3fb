//! Entities produced by the extractors.
//!
//! Entities live for one block. They reach the stores only through the
//! state-builders, serialized as JSON.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_types::BlockNum;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub decimals: u8,
}

impl Token {
    /// Raw token units as a decimal amount.
    pub fn normalize(&self, raw: u128) -> f64 {
        normalize(raw, self.decimals)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub address: String,
    pub factory: String,
    pub token0: Token,
    pub token1: Token,
    pub created_at_block: BlockNum,
    pub created_at_timestamp: u64,
}

/// New pairs of one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairs(pub Vec<Pair>);

impl Pairs {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pair> {
        self.0.iter()
    }

    pub fn print(&self) {
        for pair in &self.0 {
            debug!(
                pair = %pair.address,
                token0 = %pair.token0.address,
                token1 = %pair.token1.address,
                block = pair.created_at_block,
                "Pair created"
            );
        }
    }
}

/// Latest reserves of a pair, as stored under `reserves:<pair>`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserveUpdate {
    pub pair: String,
    #[serde_as(as = "DisplayFromStr")]
    pub reserve0: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub reserve1: u128,
    /// `reserve0` in token0 units.
    pub normalized0: f64,
    /// `reserve1` in token1 units.
    pub normalized1: f64,
    pub block_number: BlockNum,
}

impl ReserveUpdate {
    /// Price of token0 in token1, and of token1 in token0.
    ///
    /// `None` while either side of the pool is empty.
    pub fn prices(&self) -> Option<(f64, f64)> {
        if self.normalized0 == 0.0 || self.normalized1 == 0.0 {
            return None;
        }
        Some((
            self.normalized1 / self.normalized0,
            self.normalized0 / self.normalized1,
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reserves(pub Vec<ReserveUpdate>);

impl Reserves {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReserveUpdate> {
        self.0.iter()
    }

    pub fn print(&self) {
        for update in &self.0 {
            debug!(
                pair = %update.pair,
                reserve0 = update.normalized0,
                reserve1 = update.normalized1,
                "Reserves updated"
            );
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    pub pair: String,
    pub sender: String,
    pub to: String,
    #[serde_as(as = "DisplayFromStr")]
    pub amount0_in: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub amount1_in: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub amount0_out: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub amount1_out: u128,
    /// Traded token0 volume (in + out), in token0 units.
    pub volume0: f64,
    /// Traded token1 volume (in + out), in token1 units.
    pub volume1: f64,
    /// token0 price in token1 after this block's reserves, if known.
    pub token0_price: Option<f64>,
    pub block_number: BlockNum,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Swaps(pub Vec<Swap>);

impl Swaps {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Swap> {
        self.0.iter()
    }

    pub fn print(&self) {
        for swap in &self.0 {
            debug!(
                pair = %swap.pair,
                volume0 = swap.volume0,
                volume1 = swap.volume1,
                "Swap"
            );
        }
    }
}

pub(crate) fn normalize(raw: u128, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(i32::from(decimals))
}
