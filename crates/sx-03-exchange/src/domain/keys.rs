//! Store key layout.

pub const PAIR_PREFIX: &str = "pair:";
pub const TOKEN_PREFIX: &str = "token:";
pub const VOLUME_PREFIX: &str = "volume:";

/// Total pair count in `total_pairs`.
pub const TOTAL_PAIRS: &str = "pairs";
/// Total swap count in `total_pairs`.
pub const TOTAL_SWAPS: &str = "swaps";

const SECONDS_PER_DAY: u64 = 86_400;

pub fn pair(address: &str) -> String {
    format!("{PAIR_PREFIX}{address}")
}

pub fn token(address: &str) -> String {
    format!("{TOKEN_PREFIX}{address}")
}

pub fn reserves(pair: &str) -> String {
    format!("reserves:{pair}")
}

pub fn price(pair: &str, side: Side) -> String {
    format!("price:{pair}:{side}")
}

pub fn pair_swaps(pair: &str) -> String {
    format!("swaps:{pair}")
}

pub fn volume(day: u64, pair: &str, side: Side) -> String {
    format!("{VOLUME_PREFIX}{day}:{pair}:{side}")
}

pub fn volume_day_prefix(day: u64) -> String {
    format!("{VOLUME_PREFIX}{day}:")
}

/// Day bucket of a `volume:` key.
pub fn volume_day(key: &str) -> Option<u64> {
    key.strip_prefix(VOLUME_PREFIX)?.split(':').next()?.parse().ok()
}

/// UTC day number of a unix timestamp.
pub fn day_of(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Token0,
    Token1,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Token0 => f.write_str("token0"),
            Side::Token1 => f.write_str("token1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(pair("0xp"), "pair:0xp");
        assert_eq!(price("0xp", Side::Token1), "price:0xp:token1");
        assert_eq!(volume(19_000, "0xp", Side::Token0), "volume:19000:0xp:token0");
        assert_eq!(volume_day("volume:19000:0xp:token0"), Some(19_000));
        assert_eq!(volume_day("price:0xp:token0"), None);
    }

    #[test]
    fn test_day_of() {
        assert_eq!(day_of(0), 0);
        assert_eq!(day_of(86_399), 0);
        assert_eq!(day_of(86_400), 1);
    }
}
