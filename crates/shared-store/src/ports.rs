use crate::errors::ObjectStoreError;
use async_trait::async_trait;

/// Durable object storage abstraction.
///
/// Writes replace the whole object. Readers never observe a partially
/// written object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (or overwrite) an object.
    async fn write_object(&self, name: &str, data: Vec<u8>) -> Result<(), ObjectStoreError>;

    /// Read a whole object. Missing objects yield [`ObjectStoreError::NotFound`].
    async fn read_object(&self, name: &str) -> Result<Vec<u8>, ObjectStoreError>;

    /// Check whether an object exists.
    async fn object_exists(&self, name: &str) -> Result<bool, ObjectStoreError>;

    /// List object names starting with `prefix`, sorted ascending.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError>;

    /// Human readable location, for logs.
    fn describe(&self) -> String;
}
