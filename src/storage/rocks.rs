//! RocksDB-backed storage engine

use std::sync::atomic::{AtomicBool, Ordering};

use rocksdb::{Direction, IteratorMode, Options, WriteOptions, DB};

use crate::storage::config::StoreConfig;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::{KeyValue, StorageEngine};

/// Storage engine over a single RocksDB database
pub struct RocksEngine {
    db: DB,
    /// Fsync the WAL on every write
    sync_writes: bool,
    /// Closed flag
    closed: AtomicBool,
}

impl RocksEngine {
    /// Open (and create if configured) the database in `config.dir`
    pub fn open(config: &StoreConfig) -> StorageResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.optimize_level_style_compaction(0);

        let db = DB::open(&opts, &config.dir)?;
        tracing::info!(dir = %config.dir.display(), "opened RocksDB store");

        Ok(Self {
            db,
            sync_writes: config.sync_writes,
            closed: AtomicBool::new(false),
        })
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }

    fn check_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

impl StorageEngine for RocksEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.check_open()?;
        Ok(self.db.get(key)?)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.check_open()?;
        self.db.put_opt(key, value, &self.write_options())?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.check_open()?;
        self.db.delete_opt(key, &self.write_options())?;
        Ok(())
    }

    fn scan(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> StorageResult<Vec<KeyValue>> {
        self.check_open()?;

        let mode = match start {
            Some(s) => IteratorMode::From(s, Direction::Forward),
            None => IteratorMode::Start,
        };

        let mut result = Vec::new();
        for item in self.db.iterator(mode) {
            let (key, value) = item?;
            if end.is_some_and(|e| &*key >= e) {
                break;
            }
            result.push((key.into_vec(), value.into_vec()));
        }
        Ok(result)
    }

    fn flush(&self) -> StorageResult<()> {
        self.check_open()?;
        self.db.flush()?;
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::config::Backend;

    fn config(dir: &std::path::Path) -> StoreConfig {
        StoreConfig {
            backend: Backend::RocksDb,
            dir: dir.to_path_buf(),
            create_if_missing: true,
            sync_writes: false,
        }
    }

    #[test]
    fn test_put_get_scan() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = RocksEngine::open(&config(tmp.path())).unwrap();

        engine.put(b"a", b"1").unwrap();
        engine.put(b"b", b"2").unwrap();
        engine.put(b"c", b"3").unwrap();

        assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(engine.get(b"z").unwrap(), None);

        let range = engine.scan(Some(b"b"), Some(b"c")).unwrap();
        assert_eq!(range, vec![(b"b".to_vec(), b"2".to_vec())]);
        assert_eq!(engine.scan(None, None).unwrap().len(), 3);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let engine = RocksEngine::open(&config(tmp.path())).unwrap();
            engine.put(b"key", b"value").unwrap();
            engine.close().unwrap();
        }
        let engine = RocksEngine::open(&config(tmp.path())).unwrap();
        assert_eq!(engine.get(b"key").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn test_missing_dir_without_create() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config(&tmp.path().join("absent"));
        cfg.create_if_missing = false;
        assert!(RocksEngine::open(&cfg).is_err());
    }
}
