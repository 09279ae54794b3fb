use serde::{Deserialize, Serialize};
use std::fmt;

/// A read-only call against a contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallRequest {
    /// Contract address, hex with `0x` prefix.
    pub to: String,
    /// Method signature, e.g. `decimals()`.
    pub method: String,
    /// ABI encoded arguments.
    #[serde(with = "hex")]
    pub data: Vec<u8>,
}

impl CallRequest {
    pub fn new(to: impl Into<String>, method: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            to: to.into(),
            method: method.into(),
            data,
        }
    }

    /// Canonical cache key.
    ///
    /// Addresses compare case-insensitively, so `0xABC` and `0xabc` share an
    /// entry.
    pub fn cache_key(&self) -> CallKey {
        CallKey(format!(
            "{}:{}:{}",
            self.to.to_ascii_lowercase(),
            self.method,
            hex::encode(&self.data)
        ))
    }
}

impl fmt::Display for CallRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.to, self.method)
    }
}

/// Canonical representation of a [`CallRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallKey(String);

impl CallKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
