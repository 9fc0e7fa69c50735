//! Store configuration
//!
//! Environment Variables:
//! - `KVAM_BACKEND` - `memory` or `rocksdb`
//! - `KVAM_DATA_DIR` - Directory of the on-disk store
//! - `KVAM_SYNC_WRITES` - `1`/`true` to fsync every write

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::storage::error::StorageError;

/// Default on-disk location of the store
pub const DEFAULT_DATA_DIR: &str = "/tmp/rocksdb_data";

/// Which key-value engine backs the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Process-local ordered map; nothing survives the process
    Memory,
    /// RocksDB database in `StoreConfig::dir`
    RocksDb,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "rocksdb") {
            Backend::RocksDb
        } else {
            Backend::Memory
        }
    }
}

impl FromStr for Backend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Backend::Memory),
            "rocksdb" | "rocks" => Ok(Backend::RocksDb),
            other => Err(StorageError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Memory => write!(f, "memory"),
            Backend::RocksDb => write!(f, "rocksdb"),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Engine backing the store
    pub backend: Backend,
    /// Data directory (ignored by the memory backend)
    pub dir: PathBuf,
    /// Create the database when the directory holds none
    pub create_if_missing: bool,
    /// Fsync every write
    pub sync_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            dir: PathBuf::from(DEFAULT_DATA_DIR),
            create_if_missing: true,
            sync_writes: false,
        }
    }
}

impl StoreConfig {
    /// In-memory store configuration
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory,
            ..Self::default()
        }
    }

    /// Read configuration from environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, StorageError> {
        let mut config = Self::default();

        if let Ok(backend) = env::var("KVAM_BACKEND") {
            config.backend = backend.parse()?;
        }
        if let Ok(dir) = env::var("KVAM_DATA_DIR") {
            config.dir = PathBuf::from(dir);
        }
        if let Ok(sync) = env::var("KVAM_SYNC_WRITES") {
            config.sync_writes = matches!(sync.trim(), "1" | "true" | "yes" | "on");
        }

        Ok(config)
    }
}
