use async_trait::async_trait;
use shared_types::BlockNum;
use sx_02_call_cache::{CallClient, CallError, CallRequest};
use tracing::debug;

/// Call client without a node transport.
///
/// Every call fails with [`CallError::Unavailable`], so results come only from
/// a loaded call cache and cache misses fall back to their defaults.
#[derive(Debug, Clone)]
pub struct OfflineCallClient {
    endpoint: String,
}

impl OfflineCallClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Configured node endpoint, reported in logs.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CallClient for OfflineCallClient {
    async fn call(&self, request: &CallRequest, block: BlockNum) -> Result<Vec<u8>, CallError> {
        debug!(endpoint = %self.endpoint, to = %request.to, method = %request.method, block, "Call not served offline");
        Err(CallError::Unavailable {
            request: request.cache_key().to_string(),
        })
    }
}
