use ipam_core::IpamError;

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record to update does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A record with this key path already exists.
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    /// A stored row was rejected by the address-space rules during a load.
    #[error("stored record {path} rejected: {source}")]
    Rejected {
        path: String,
        #[source]
        source: IpamError,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
