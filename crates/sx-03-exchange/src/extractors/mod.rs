//! Extractors: block (plus upstream store snapshots) in, entities out.
//!
//! Extractors never write to stores.

mod pairs;
mod reserves;
mod swaps;

pub use pairs::{PairExtractor, DEFAULT_DECIMALS};
pub use reserves::ReservesExtractor;
pub use swaps::SwapsExtractor;

use crate::domain::entities::Pair;
use crate::domain::errors::ExtractionError;
use crate::domain::keys;
use sx_01_state_store::StoreReader;

/// Stored pair, if the pairs store knows it.
pub(crate) fn load_pair(pairs: &dyn StoreReader, address: &str) -> Result<Option<Pair>, ExtractionError> {
    let key = keys::pair(address);
    match pairs.get(&key) {
        None => Ok(None),
        Some(raw) => serde_json::from_slice(raw)
            .map(Some)
            .map_err(|source| ExtractionError::CorruptEntity { key, source }),
    }
}
