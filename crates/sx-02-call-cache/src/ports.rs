use crate::errors::CallError;
use crate::request::CallRequest;
use async_trait::async_trait;
use shared_types::BlockNum;

/// Transport to a node answering read-only calls.
#[async_trait]
pub trait CallClient: Send + Sync {
    /// Execute `request` against the state at `block`.
    async fn call(&self, request: &CallRequest, block: BlockNum) -> Result<Vec<u8>, CallError>;
}
