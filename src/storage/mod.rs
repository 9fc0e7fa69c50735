//! Storage engine subsystem
//!
//! Provides ordered key-value storage behind the `StorageEngine` trait, with
//! an in-memory engine and (feature `rocksdb`) a RocksDB engine, plus the
//! `StoreHandle` that owns the engine for the rest of the crate.

pub mod config;
pub mod error;
pub mod format_version;
pub mod handle;
pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocks;
pub mod row_id;
pub mod traits;

pub use config::{Backend, StoreConfig};
pub use error::{StorageError, StorageResult};
pub use handle::StoreHandle;
pub use memory::MemoryEngine;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksEngine;
pub use row_id::{RowIdGenerator, RowIdRegistry};
pub use traits::{KeyValue, StorageEngine};
