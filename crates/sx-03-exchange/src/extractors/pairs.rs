use crate::domain::entities::{Pair, Pairs, Token};
use crate::domain::errors::ExtractionError;
use crate::domain::events::{ExchangeBlock, ExchangeEvent};
use std::sync::Arc;
use sx_02_call_cache::{CachedCaller, CallClient, CallRequest};
use tracing::{debug, warn};

/// Decimals assumed for tokens whose `decimals()` call fails.
pub const DEFAULT_DECIMALS: u8 = 18;

const DECIMALS_METHOD: &str = "decimals()";

/// Extracts pairs created by the watched factory.
///
/// Token decimals are resolved with a `decimals()` call through the cached
/// caller. A token without metadata still makes a valid pair and gets
/// [`DEFAULT_DECIMALS`].
pub struct PairExtractor<C> {
    factory: Option<String>,
    caller: Arc<CachedCaller<C>>,
}

impl<C: CallClient> PairExtractor<C> {
    /// `factory: None` accepts pairs from any factory.
    pub fn new(factory: Option<String>, caller: Arc<CachedCaller<C>>) -> Self {
        Self {
            factory: factory.map(|f| f.to_ascii_lowercase()),
            caller,
        }
    }

    pub async fn extract(&self, block: &ExchangeBlock) -> Result<Pairs, ExtractionError> {
        let mut pairs: Vec<Pair> = Vec::new();

        for (index, event) in block.events.iter().enumerate() {
            let ExchangeEvent::PairCreated {
                factory,
                pair,
                token0,
                token1,
            } = event
            else {
                continue;
            };

            let factory = factory.to_ascii_lowercase();
            if self.factory.as_ref().is_some_and(|f| *f != factory) {
                debug!(block = block.number, pair = %pair, factory = %factory, "Pair from other factory skipped");
                continue;
            }

            let (address, token0, token1) = (
                pair.to_ascii_lowercase(),
                token0.to_ascii_lowercase(),
                token1.to_ascii_lowercase(),
            );
            if address.is_empty() || token0.is_empty() || token1.is_empty() {
                return Err(invalid(block, index, "pair or token address is empty"));
            }
            if token0 == token1 {
                return Err(invalid(block, index, "pair tokens are identical"));
            }
            if pairs.iter().any(|p| p.address == address) {
                continue;
            }

            pairs.push(Pair {
                address,
                factory,
                token0: self.token(&token0, block.number).await,
                token1: self.token(&token1, block.number).await,
                created_at_block: block.number,
                created_at_timestamp: block.timestamp,
            });
        }

        Ok(Pairs(pairs))
    }

    async fn token(&self, address: &str, block: u64) -> Token {
        let request = CallRequest::new(address, DECIMALS_METHOD, Vec::new());
        let decimals = match self.caller.call(&request, block).await {
            Ok(raw) => decode_uint8(&raw).unwrap_or_else(|| {
                warn!(token = %address, "Undecodable decimals() result, using default");
                DEFAULT_DECIMALS
            }),
            Err(e) => {
                warn!(token = %address, error = %e, "decimals() call failed, using default");
                DEFAULT_DECIMALS
            }
        };
        Token {
            address: address.to_string(),
            decimals,
        }
    }
}

fn invalid(block: &ExchangeBlock, index: usize, reason: &str) -> ExtractionError {
    ExtractionError::InvalidEvent {
        block: block.number,
        index,
        reason: reason.to_string(),
    }
}

/// Big-endian unsigned integer (an ABI word or shorter) that fits in a `u8`.
fn decode_uint8(raw: &[u8]) -> Option<u8> {
    if raw.is_empty() || raw.len() > 32 {
        return None;
    }
    let (high, low) = raw.split_at(raw.len() - 1);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    low.first().copied()
}
