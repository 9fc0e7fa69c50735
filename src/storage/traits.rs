//! Storage engine trait definition

use crate::storage::error::StorageResult;

/// A key-value pair
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// Abstract storage engine interface
///
/// Provides ordered key-value storage with point lookups and range scans.
/// Every call completes synchronously; implementations must be safe to share
/// between threads.
pub trait StorageEngine: Send + Sync {
    /// Get a value by key
    ///
    /// Returns `None` if the key does not exist.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Put a key-value pair
    ///
    /// Overwrites any existing value for the key.
    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Delete a key
    ///
    /// No-op if the key does not exist.
    fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Scan a range of keys
    ///
    /// Returns key-value pairs in sorted order where `start <= key < end`.
    /// If `start` is `None`, scan from the beginning.
    /// If `end` is `None`, scan to the end.
    fn scan(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> StorageResult<Vec<KeyValue>>;

    /// Flush all pending writes to durable storage
    fn flush(&self) -> StorageResult<()>;

    /// Close the storage engine
    fn close(&self) -> StorageResult<()>;
}
