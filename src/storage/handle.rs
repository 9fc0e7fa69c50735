//! Store handle
//!
//! The handle owns the connection to the key-value engine together with the
//! coordination state every component needs: the catalog mutex and the
//! per-table row id generators. Components receive it as `Arc<StoreHandle>`.
//!
//! At most one live handle may own an on-disk directory per process; a second
//! `open` of the same directory fails with `StorageError::AlreadyOpen` until
//! the first handle is dropped.

#[cfg(feature = "rocksdb")]
use std::collections::BTreeSet;
#[cfg(feature = "rocksdb")]
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "rocksdb")]
use parking_lot::const_mutex;
use parking_lot::{Mutex, MutexGuard};

use crate::storage::config::{Backend, StoreConfig};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::format_version::ensure_format_version;
use crate::storage::memory::MemoryEngine;
use crate::storage::row_id::RowIdRegistry;
use crate::storage::traits::StorageEngine;

/// Directories currently owned by a live handle
#[cfg(feature = "rocksdb")]
static OPEN_DIRS: Mutex<BTreeSet<PathBuf>> = const_mutex(BTreeSet::new());

/// Releases a directory claim on drop
#[cfg(feature = "rocksdb")]
struct DirGuard(PathBuf);

#[cfg(feature = "rocksdb")]
impl DirGuard {
    fn claim(dir: &Path) -> StorageResult<Self> {
        let dir = std::path::absolute(dir)?;
        let mut open = OPEN_DIRS.lock();
        if !open.insert(dir.clone()) {
            return Err(StorageError::AlreadyOpen(dir));
        }
        Ok(DirGuard(dir))
    }
}

#[cfg(feature = "rocksdb")]
impl Drop for DirGuard {
    fn drop(&mut self) {
        OPEN_DIRS.lock().remove(&self.0);
    }
}

/// Owned connection to the key-value engine
pub struct StoreHandle {
    engine: Arc<dyn StorageEngine>,
    /// Serializes catalog read-modify-write
    catalog_lock: Mutex<()>,
    /// Per-table row id generators
    row_ids: RowIdRegistry,
    /// Declared last so the engine is dropped before the claim is released
    #[cfg(feature = "rocksdb")]
    _dir_guard: Option<DirGuard>,
}

impl StoreHandle {
    /// Open the engine described by `config`
    pub fn open(config: &StoreConfig) -> StorageResult<Self> {
        match config.backend {
            Backend::Memory => Self::with_engine(Arc::new(MemoryEngine::new())),
            Backend::RocksDb => Self::open_rocksdb(config),
        }
    }

    #[cfg(feature = "rocksdb")]
    fn open_rocksdb(config: &StoreConfig) -> StorageResult<Self> {
        let guard = DirGuard::claim(&config.dir)?;
        let engine = crate::storage::rocks::RocksEngine::open(config)?;
        let mut handle = Self::with_engine(Arc::new(engine))?;
        handle._dir_guard = Some(guard);
        Ok(handle)
    }

    #[cfg(not(feature = "rocksdb"))]
    fn open_rocksdb(_config: &StoreConfig) -> StorageResult<Self> {
        Err(StorageError::BackendUnavailable(Backend::RocksDb.to_string()))
    }

    /// Wrap an already open engine
    ///
    /// Stamps a fresh store with the current format version and refuses one
    /// written in another format.
    pub fn with_engine(engine: Arc<dyn StorageEngine>) -> StorageResult<Self> {
        ensure_format_version(engine.as_ref())?;
        Ok(Self {
            engine,
            catalog_lock: Mutex::new(()),
            row_ids: RowIdRegistry::new(),
            #[cfg(feature = "rocksdb")]
            _dir_guard: None,
        })
    }

    /// The underlying engine
    pub fn engine(&self) -> &dyn StorageEngine {
        self.engine.as_ref()
    }

    /// Acquire the catalog mutex
    pub fn lock_catalog(&self) -> MutexGuard<'_, ()> {
        self.catalog_lock.lock()
    }

    /// Per-table row id generators
    pub fn row_ids(&self) -> &RowIdRegistry {
        &self.row_ids
    }

    /// Flush and close the engine; later operations fail with `Closed`
    pub fn close(&self) -> StorageResult<()> {
        self.engine.close()
    }
}
