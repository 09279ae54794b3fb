use super::encode;
use crate::domain::entities::Pairs;
use crate::domain::errors::StateBuildError;
use crate::domain::keys;
use sx_01_state_store::Store;

/// Writes `pair:<addr>` and `token:<addr>` into the `pairs` store.
#[derive(Debug, Default, Clone, Copy)]
pub struct PairsStateBuilder;

impl PairsStateBuilder {
    /// Returns how many pairs were new. Known pairs and tokens are left
    /// untouched.
    pub fn build(&self, pairs: &Pairs, store: &mut Store) -> Result<usize, StateBuildError> {
        let mut created = 0;
        for pair in pairs.iter() {
            let key = keys::pair(&pair.address);
            let value = encode(&key, pair)?;
            if !store.set_if_not_exists(key, value) {
                continue;
            }
            created += 1;

            for token in [&pair.token0, &pair.token1] {
                let key = keys::token(&token.address);
                let value = encode(&key, token)?;
                store.set_if_not_exists(key, value);
            }
        }
        Ok(created)
    }
}
