use crate::cache::CallCache;
use crate::errors::CallError;
use crate::ports::CallClient;
use crate::request::CallRequest;
use shared_types::BlockNum;
use std::sync::Arc;
use tracing::debug;

/// A [`CallClient`] front that consults a [`CallCache`] first.
///
/// - Inside the cache window: hit returns the cached bytes, miss calls the
///   client and caches a successful result
/// - Outside the window: always calls through, nothing is cached
/// - Failed calls are never cached
pub struct CachedCaller<C> {
    client: C,
    cache: Arc<CallCache>,
}

impl<C: CallClient> CachedCaller<C> {
    pub fn new(client: C, cache: Arc<CallCache>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &Arc<CallCache> {
        &self.cache
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn call(&self, request: &CallRequest, block: BlockNum) -> Result<Vec<u8>, CallError> {
        if !self.cache.contains_block(block) {
            return self.client.call(request, block).await;
        }

        let key = request.cache_key();
        if let Some(value) = self.cache.get(&key) {
            return Ok(value);
        }

        let value = self.client.call(request, block).await?;
        self.cache.put(key, value.clone());
        debug!(request = %request, block, "Call result cached");
        Ok(value)
    }
}
