//! Pre-decoded exchange events carried in a block payload.
//!
//! The payload is JSON:
//!
//! ```json
//! {"events": [
//!   {"type": "pair_created", "factory": "0xf", "pair": "0xp", "token0": "0xa", "token1": "0xb"},
//!   {"type": "sync", "pair": "0xp", "reserve0": "1000", "reserve1": "2000"},
//!   {"type": "swap", "pair": "0xp", "sender": "0xs", "to": "0xt",
//!    "amount0_in": "10", "amount1_in": "0", "amount0_out": "0", "amount1_out": "19"}
//! ]}
//! ```
//!
//! Amounts are decimal strings of raw token units. An empty payload is a
//! block without exchange activity.

use super::errors::DecodeError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_types::{Block, BlockNum};

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExchangeEvent {
    PairCreated {
        factory: String,
        pair: String,
        token0: String,
        token1: String,
    },
    Sync {
        pair: String,
        #[serde_as(as = "DisplayFromStr")]
        reserve0: u128,
        #[serde_as(as = "DisplayFromStr")]
        reserve1: u128,
    },
    Swap {
        pair: String,
        #[serde(default)]
        sender: String,
        #[serde(default)]
        to: String,
        #[serde_as(as = "DisplayFromStr")]
        amount0_in: u128,
        #[serde_as(as = "DisplayFromStr")]
        amount1_in: u128,
        #[serde_as(as = "DisplayFromStr")]
        amount0_out: u128,
        #[serde_as(as = "DisplayFromStr")]
        amount1_out: u128,
    },
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    events: Vec<ExchangeEvent>,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    events: &'a [ExchangeEvent],
}

/// A block with its payload decoded into exchange events, in log order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeBlock {
    pub number: BlockNum,
    pub id: String,
    pub timestamp: u64,
    pub events: Vec<ExchangeEvent>,
}

impl ExchangeBlock {
    pub fn decode(block: &Block) -> Result<Self, DecodeError> {
        let payload = if block.payload.is_empty() {
            Payload::default()
        } else {
            serde_json::from_slice::<Payload>(&block.payload).map_err(|source| {
                DecodeError::Payload {
                    block: block.number,
                    source,
                }
            })?
        };

        Ok(Self {
            number: block.number,
            id: block.id.clone(),
            timestamp: block.timestamp,
            events: payload.events,
        })
    }

    /// Encode events as a block payload.
    pub fn encode_payload(events: &[ExchangeEvent]) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&PayloadRef { events })
    }
}
