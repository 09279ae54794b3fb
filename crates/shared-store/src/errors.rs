use thiserror::Error;

/// Errors raised by object store adapters.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Object not found: {name}")]
    NotFound { name: String },

    #[error("Invalid object name: {name:?}")]
    InvalidName { name: String },

    #[error("Unsupported store url: {url}")]
    UnsupportedUrl { url: String },

    #[error("I/O error on {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl ObjectStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ObjectStoreError::NotFound { .. })
    }

    pub(crate) fn io(name: impl Into<String>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return ObjectStoreError::NotFound { name: name.into() };
        }
        ObjectStoreError::Io {
            name: name.into(),
            source,
        }
    }
}

/// Object names must be non-empty, flat and free of path tricks.
pub(crate) fn check_name(name: &str) -> Result<(), ObjectStoreError> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.ends_with(".tmp");
    if valid {
        Ok(())
    } else {
        Err(ObjectStoreError::InvalidName {
            name: name.to_string(),
        })
    }
}
