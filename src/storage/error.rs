//! Storage error types

use std::path::PathBuf;

use thiserror::Error;

/// Storage operation errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Standard IO error
    #[error("IO error: {0}")]
    StdIo(#[from] std::io::Error),

    /// Error reported by RocksDB
    #[cfg(feature = "rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Backend was requested but not compiled in
    #[error("Storage backend '{0}' is not available in this build")]
    BackendUnavailable(String),

    /// Unknown backend name in configuration
    #[error("Unknown storage backend: {0}")]
    UnknownBackend(String),

    /// Another live handle already owns this directory
    #[error("Store at {} is already open in this process", .0.display())]
    AlreadyOpen(PathBuf),

    /// On-disk layout written by an incompatible version
    #[error("Incompatible store format: found version {found}, expected {expected}")]
    IncompatibleFormat { found: u32, expected: u32 },

    /// Format marker present but unreadable
    #[error("Corrupted format marker: {0}")]
    CorruptedMarker(String),

    /// Storage is closed
    #[error("Storage is closed")]
    Closed,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
