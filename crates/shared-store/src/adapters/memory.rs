use crate::errors::{check_name, ObjectStoreError};
use crate::ports::ObjectStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// In-memory implementation of [`ObjectStore`] for testing.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Overwrite raw bytes, bypassing name checks. Used to simulate corruption.
    pub fn tamper(&self, name: &str, data: Vec<u8>) {
        self.objects.write().insert(name.to_string(), data);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn write_object(&self, name: &str, data: Vec<u8>) -> Result<(), ObjectStoreError> {
        check_name(name)?;
        self.objects.write().insert(name.to_string(), data);
        Ok(())
    }

    async fn read_object(&self, name: &str) -> Result<Vec<u8>, ObjectStoreError> {
        self.objects
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound {
                name: name.to_string(),
            })
    }

    async fn object_exists(&self, name: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.objects.read().contains_key(name))
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        Ok(self
            .objects
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_object_operations() {
        let store = InMemoryObjectStore::new();

        store.write_object("state-pairs-0000000010.kv", vec![1, 2]).await.unwrap();
        store.write_object("state-pairs-0000000005.kv", vec![3]).await.unwrap();
        store.write_object("state-prices-0000000005.kv", vec![4]).await.unwrap();

        assert_eq!(store.read_object("state-pairs-0000000010.kv").await.unwrap(), vec![1, 2]);
        assert!(store.object_exists("state-prices-0000000005.kv").await.unwrap());

        let listed = store.list_objects("state-pairs-").await.unwrap();
        assert_eq!(
            listed,
            vec!["state-pairs-0000000005.kv", "state-pairs-0000000010.kv"]
        );
    }

    #[tokio::test]
    async fn test_missing_object() {
        let store = InMemoryObjectStore::new();
        let err = store.read_object("nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.object_exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_nested_names() {
        let store = InMemoryObjectStore::new();
        assert!(store.write_object("a/b", vec![]).await.is_err());
        assert!(store.write_object("", vec![]).await.is_err());
        assert!(store.is_empty());
    }
}
