//! # sx-03-exchange
//!
//! Exchange domain for the pipeline: decodes the per-block event payload,
//! extracts pairs, reserves and swaps, and folds them into the four stores.
//!
//! ## Dependency Order (one block)
//!
//! ```text
//! PairExtractor ──→ PairsStateBuilder ──→ [pairs]
//!                                            │
//! ReservesExtractor(pairs) ──→ PricesStateBuilder ──→ [prices]
//!                                                        │
//! SwapsExtractor(pairs, prices) ──→ TotalPairsStateBuilder ──→ [total_pairs]
//!                               └─→ Volume24hStateBuilder  ──→ [volume24h]
//! ```
//!
//! A reader downstream of a store always sees that store as of the block
//! being processed.
//!
//! ## Store Keys
//!
//! | Store | Keys |
//! |-------|------|
//! | `pairs` | `pair:<addr>`, `token:<addr>` |
//! | `prices` | `price:<pair>:token0`, `price:<pair>:token1`, `reserves:<pair>` |
//! | `total_pairs` | `pairs`, `swaps`, `swaps:<pair>` |
//! | `volume24h` | `volume:<day>:<pair>:token0`, `volume:<day>:<pair>:token1` |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod builders;
pub mod domain;
pub mod extractors;

pub use builders::{
    PairsStateBuilder, PricesStateBuilder, TotalPairsStateBuilder, Volume24hStateBuilder,
};
pub use domain::entities::{Pair, Pairs, ReserveUpdate, Reserves, Swap, Swaps, Token};
pub use domain::errors::{DecodeError, ExtractionError, StateBuildError};
pub use domain::events::{ExchangeBlock, ExchangeEvent};
pub use extractors::{PairExtractor, ReservesExtractor, SwapsExtractor, DEFAULT_DECIMALS};

/// Store names, also used as hub topic names.
pub mod stores {
    pub const PAIRS: &str = "pairs";
    pub const TOTAL_PAIRS: &str = "total_pairs";
    pub const PRICES: &str = "prices";
    pub const VOLUME_24H: &str = "volume24h";

    /// Every store, in build order.
    pub const ALL: [&str; 4] = [PAIRS, PRICES, TOTAL_PAIRS, VOLUME_24H];
}
