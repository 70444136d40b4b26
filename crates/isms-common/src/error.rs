//! Error types for the storage boundary

use thiserror::Error;

/// Storage error type
#[derive(Error, Debug)]
pub enum StorageError {
    /// Total stored bytes would exceed the backend quota
    #[error("storage quota exceeded: {used} bytes of {limit}")]
    QuotaExceeded {
        /// Bytes the store would hold after the write
        used: usize,
        /// Backend quota
        limit: usize,
    },

    /// A single serialized value is above the save ceiling
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Serialized size
        size: usize,
        /// Save ceiling
        max: usize,
    },

    /// Stored value does not parse into the expected record
    #[error("corrupt data under '{key}': {reason}")]
    Corrupt {
        /// Storage key
        key: String,
        /// Parser message
        reason: String,
    },

    /// Value could not be serialized
    #[error("serialization error: {0}")]
    Serialize(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True when the error means "value present but unreadable"
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
