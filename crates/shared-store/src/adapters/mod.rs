mod local;
mod memory;

pub use local::LocalObjectStore;
pub use memory::InMemoryObjectStore;

use crate::errors::ObjectStoreError;
use crate::ports::ObjectStore;
use std::sync::Arc;

/// Open an object store from a url.
///
/// - `memory://` → [`InMemoryObjectStore`]
/// - `file:///some/dir` or a plain path → [`LocalObjectStore`]
pub fn open_store(url: &str) -> Result<Arc<dyn ObjectStore>, ObjectStoreError> {
    if url == "memory://" || url == "mem://" {
        return Ok(Arc::new(InMemoryObjectStore::new()));
    }
    if let Some(path) = url.strip_prefix("file://") {
        if path.is_empty() {
            return Err(ObjectStoreError::UnsupportedUrl {
                url: url.to_string(),
            });
        }
        return Ok(Arc::new(LocalObjectStore::new(path)));
    }
    if url.contains("://") || url.is_empty() {
        return Err(ObjectStoreError::UnsupportedUrl {
            url: url.to_string(),
        });
    }
    Ok(Arc::new(LocalObjectStore::new(url)))
}
