use crate::errors::{check_name, ObjectStoreError};
use crate::ports::ObjectStore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Directory-backed object store.
///
/// Each object is one file. Writes go through a temp file that is synced and
/// renamed into place, so a crash never leaves a half-written object.
pub struct LocalObjectStore {
    base: PathBuf,
}

impl LocalObjectStore {
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn write_object(&self, name: &str, data: Vec<u8>) -> Result<(), ObjectStoreError> {
        check_name(name)?;

        tokio::fs::create_dir_all(&self.base)
            .await
            .map_err(|e| ObjectStoreError::io(self.base.display().to_string(), e))?;

        let path = self.path_of(name);
        let temp_path = self.path_of(&format!("{name}.tmp"));

        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| ObjectStoreError::io(name, e))?;
        file.write_all(&data)
            .await
            .map_err(|e| ObjectStoreError::io(name, e))?;
        file.sync_all()
            .await
            .map_err(|e| ObjectStoreError::io(name, e))?;
        drop(file);

        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| ObjectStoreError::io(name, e))?;

        debug!(object = name, bytes = data.len(), "Object written");
        Ok(())
    }

    async fn read_object(&self, name: &str) -> Result<Vec<u8>, ObjectStoreError> {
        check_name(name)?;
        tokio::fs::read(self.path_of(name))
            .await
            .map_err(|e| ObjectStoreError::io(name, e))
    }

    async fn object_exists(&self, name: &str) -> Result<bool, ObjectStoreError> {
        check_name(name)?;
        tokio::fs::try_exists(self.path_of(name))
            .await
            .map_err(|e| ObjectStoreError::io(name, e))
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        let base = self.base.display().to_string();
        let mut entries = match tokio::fs::read_dir(&self.base).await {
            Ok(entries) => entries,
            // Nothing written yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ObjectStoreError::io(base, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ObjectStoreError::io(base.clone(), e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with(prefix) && !name.ends_with(".tmp") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn describe(&self) -> String {
        format!("file://{}", self.base.display())
    }
}
