//! Error types for the mock data layer.

/// Errors that can occur while reading or writing mock records.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A collection name or record key is not usable.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The stored document is not in the expected layout.
    #[error("corrupt collection {collection}: {message}")]
    Corrupt {
        /// Collection whose document is malformed.
        collection: String,
        /// What was wrong with it.
        message: String,
    },
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
