//! In-memory ordered storage engine
//!
//! Keeps every key in a `BTreeMap`, so range scans come back in byte order
//! exactly as they would from an on-disk engine. Contents live as long as the
//! engine does.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::{KeyValue, StorageEngine};

/// Ordered in-memory key-value engine
pub struct MemoryEngine {
    /// Sorted map of key -> value
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    /// Closed flag
    closed: AtomicBool,
}

impl MemoryEngine {
    /// Create a new empty engine
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the engine holds no keys
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn check_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for MemoryEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.check_open()?;
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.check_open()?;
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.check_open()?;
        self.data.write().remove(key);
        Ok(())
    }

    fn scan(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> StorageResult<Vec<KeyValue>> {
        self.check_open()?;
        let data = self.data.read();

        // An inverted range would make BTreeMap::range panic
        if let (Some(s), Some(e)) = (start, end) {
            if s >= e {
                return Ok(Vec::new());
            }
        }

        let iter: Box<dyn Iterator<Item = _>> = match (start, end) {
            (None, None) => Box::new(data.iter()),
            (Some(s), None) => Box::new(data.range(s.to_vec()..)),
            (None, Some(e)) => Box::new(data.range(..e.to_vec())),
            (Some(s), Some(e)) => Box::new(data.range(s.to_vec()..e.to_vec())),
        };

        Ok(iter.map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn flush(&self) -> StorageResult<()> {
        self.check_open()
    }

    fn close(&self) -> StorageResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get() {
        let mem = MemoryEngine::new();

        mem.put(b"key1", b"value1").unwrap();
        mem.put(b"key2", b"value2").unwrap();

        assert_eq!(mem.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(mem.get(b"key2").unwrap(), Some(b"value2".to_vec()));
        assert_eq!(mem.get(b"key3").unwrap(), None);
    }

    #[test]
    fn test_delete() {
        let mem = MemoryEngine::new();

        mem.put(b"key1", b"value1").unwrap();
        mem.delete(b"key1").unwrap();
        assert_eq!(mem.get(b"key1").unwrap(), None);

        // Deleting a missing key is fine
        mem.delete(b"key2").unwrap();
        assert!(mem.is_empty());
    }

    #[test]
    fn test_scan() {
        let mem = MemoryEngine::new();

        mem.put(b"a", b"1").unwrap();
        mem.put(b"b", b"2").unwrap();
        mem.put(b"c", b"3").unwrap();
        mem.put(b"d", b"4").unwrap();

        let result = mem.scan(Some(b"b"), Some(b"d")).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], (b"b".to_vec(), b"2".to_vec()));
        assert_eq!(result[1], (b"c".to_vec(), b"3".to_vec()));

        assert_eq!(mem.scan(None, None).unwrap().len(), 4);
        assert_eq!(mem.scan(Some(b"c"), None).unwrap().len(), 2);
        assert_eq!(mem.scan(None, Some(b"b")).unwrap().len(), 1);
    }

    #[test]
    fn test_scan_inverted_range() {
        let mem = MemoryEngine::new();
        mem.put(b"a", b"1").unwrap();
        assert!(mem.scan(Some(b"z"), Some(b"a")).unwrap().is_empty());
    }

    #[test]
    fn test_overwrite() {
        let mem = MemoryEngine::new();

        mem.put(b"key", b"value1").unwrap();
        mem.put(b"key", b"value2").unwrap();
        assert_eq!(mem.get(b"key").unwrap(), Some(b"value2".to_vec()));
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn test_closed() {
        let mem = MemoryEngine::new();
        mem.close().unwrap();
        assert!(matches!(mem.get(b"key"), Err(StorageError::Closed)));
        assert!(matches!(mem.put(b"key", b"v"), Err(StorageError::Closed)));
    }
}
