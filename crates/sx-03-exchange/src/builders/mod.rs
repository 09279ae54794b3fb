//! State-builders: each owns exactly one store and writes it from entities.
//!
//! Builders run in dependency order; see the crate docs.

mod pairs;
mod prices;
mod total_pairs;
mod volume;

pub use pairs::PairsStateBuilder;
pub use prices::PricesStateBuilder;
pub use total_pairs::TotalPairsStateBuilder;
pub use volume::Volume24hStateBuilder;

use crate::domain::errors::StateBuildError;
use serde::Serialize;

pub(crate) fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>, StateBuildError> {
    serde_json::to_vec(value).map_err(|source| StateBuildError::Encode {
        key: key.to_string(),
        source,
    })
}
