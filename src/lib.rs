//! kvam - relational tables on an ordered key-value store
//!
//! Layers, bottom up:
//! - `storage`: ordered key-value engines (in-memory, RocksDB) and the
//!   shared `StoreHandle`
//! - `catalog`: the directory of table names
//! - `executor`: key and row encoding, inserts, and snapshot scans
//! - `am`: the table access method callbacks the host engine invokes

pub mod am;
pub mod catalog;
pub mod executor;
pub mod storage;
