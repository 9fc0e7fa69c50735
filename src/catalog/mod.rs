//! Catalog - the directory of known tables
//!
//! The catalog is a single record under the reserved key `tables` holding the
//! comma-joined list of table names in creation order. Column types are not
//! persisted here; the host engine supplies them on every call.
//!
//! Updates are whole-value read-modify-write cycles serialized by the store
//! handle's catalog mutex.

use thiserror::Error;

use crate::executor::datum::Datum;
use crate::executor::error::ErrorKind;
use crate::storage::{StorageError, StoreHandle};

/// Reserved key holding the table list
pub const TABLES_KEY: &[u8] = b"tables";

/// Longest accepted table name in bytes
pub const MAX_TABLE_NAME_LEN: usize = 63;

/// Separator between names in the stored list
const TABLE_LIST_SEPARATOR: char = ',';

/// Column data types supplied by the host's relation descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Boolean (true/false)
    Boolean,
    /// 16-bit signed integer
    SmallInt,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    BigInt,
    /// 32-bit floating point
    Real,
    /// 64-bit floating point
    Double,
    /// Variable-length string with max length in characters
    Varchar(u32),
    /// Unlimited text
    Text,
    /// Binary data
    Bytea,
}

impl DataType {
    /// Check if a value can be stored in a column of this type
    ///
    /// NULL fits every type.
    pub fn accepts(&self, datum: &Datum) -> bool {
        match (self, datum) {
            (_, Datum::Null) => true,
            (DataType::Boolean, Datum::Bool(_)) => true,
            (DataType::SmallInt, Datum::Int(i)) => i16::try_from(*i).is_ok(),
            (DataType::Int, Datum::Int(i)) => i32::try_from(*i).is_ok(),
            (DataType::BigInt, Datum::Int(_)) => true,
            (DataType::Real | DataType::Double, Datum::Float(_)) => true,
            (DataType::Varchar(max), Datum::Text(s)) => s.chars().count() <= *max as usize,
            (DataType::Text, Datum::Text(_)) => true,
            (DataType::Bytea, Datum::Bytes(_)) => true,
            _ => false,
        }
    }
}

/// Catalog error
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The directory record has never been written
    #[error("Catalog directory is not initialized")]
    NotInitialized,

    /// Name cannot be stored in the directory or used as a key prefix
    #[error("Invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: &'static str },

    /// A concurrent writer replaced the directory after our write
    #[error("Catalog update for table '{0}' was lost")]
    LostUpdate(String),

    /// Directory value is not a valid name list
    #[error("Corrupted catalog: {0}")]
    Corrupted(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CatalogError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NotInitialized => ErrorKind::NotFound,
            CatalogError::InvalidTableName { .. } => ErrorKind::InvalidArgument,
            CatalogError::LostUpdate(_) => ErrorKind::LostCatalogUpdate,
            CatalogError::Corrupted(_) => ErrorKind::DecodeError,
            CatalogError::Storage(_) => ErrorKind::StoreUnavailable,
        }
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Check that a name can be used as a table name
///
/// Bytes up to and including `#` are refused so that a table's row keys
/// (`name#...`) sort before those of every greater name; `,` is the list
/// separator.
pub fn validate_table_name(name: &str) -> CatalogResult<()> {
    let invalid = |reason| {
        Err(CatalogError::InvalidTableName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return invalid("name is empty");
    }
    if name.len() > MAX_TABLE_NAME_LEN {
        return invalid("name is longer than 63 bytes");
    }
    if name.bytes().any(|b| b <= b'#') {
        return invalid("name contains whitespace, control characters, '!', '\"' or '#'");
    }
    if name.contains(TABLE_LIST_SEPARATOR) {
        return invalid("name contains ','");
    }
    Ok(())
}

fn decode_table_list(bytes: &[u8]) -> CatalogResult<Vec<String>> {
    let list = std::str::from_utf8(bytes)
        .map_err(|_| CatalogError::Corrupted("table list is not valid utf8".to_string()))?;
    if list.is_empty() {
        return Ok(Vec::new());
    }
    Ok(list
        .split(TABLE_LIST_SEPARATOR)
        .map(str::to_string)
        .collect())
}

fn encode_table_list(tables: &[String]) -> Vec<u8> {
    tables
        .join(&TABLE_LIST_SEPARATOR.to_string())
        .into_bytes()
}

/// Write an empty directory unless one exists
///
/// Returns `true` when the directory was created by this call.
pub fn init_catalog(store: &StoreHandle) -> CatalogResult<bool> {
    let _guard = store.lock_catalog();
    if store.engine().get(TABLES_KEY)?.is_some() {
        return Ok(false);
    }
    store.engine().put(TABLES_KEY, &[])?;
    tracing::debug!("initialized empty catalog directory");
    Ok(true)
}

/// Read the table list
pub fn get_tables(store: &StoreHandle) -> CatalogResult<Vec<String>> {
    let bytes = store
        .engine()
        .get(TABLES_KEY)?
        .ok_or(CatalogError::NotInitialized)?;
    decode_table_list(&bytes)
}

/// Overwrite the whole table list
///
/// Last writer wins; callers wanting to add one name use `register_table`.
pub fn set_tables(store: &StoreHandle, tables: &[String]) -> CatalogResult<()> {
    for name in tables {
        validate_table_name(name)?;
    }
    store.engine().put(TABLES_KEY, &encode_table_list(tables))?;
    Ok(())
}

/// Add a table name to the directory if absent
///
/// Returns `true` when the name was added, `false` when already present.
pub fn register_table(store: &StoreHandle, name: &str) -> CatalogResult<bool> {
    validate_table_name(name)?;

    let _guard = store.lock_catalog();
    let mut tables = get_tables(store)?;
    if tables.iter().any(|t| t == name) {
        tracing::debug!(table = name, "table already registered");
        return Ok(false);
    }

    tables.push(name.to_string());
    set_tables(store, &tables)?;

    // A writer outside this handle may have replaced the list meanwhile
    if !get_tables(store)?.iter().any(|t| t == name) {
        tracing::warn!(table = name, "catalog update lost");
        return Err(CatalogError::LostUpdate(name.to_string()));
    }

    tracing::debug!(table = name, count = tables.len(), "registered table");
    Ok(true)
}

/// Register a newly created relation
pub fn create_table(store: &StoreHandle, name: &str) -> CatalogResult<bool> {
    register_table(store, name)
}

/// Check whether a table is registered
pub fn table_exists(store: &StoreHandle, name: &str) -> CatalogResult<bool> {
    Ok(get_tables(store)?.iter().any(|t| t == name))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{KeyValue, MemoryEngine, StorageEngine, StorageResult, StoreConfig};

    fn new_store() -> StoreHandle {
        let store = StoreHandle::open(&StoreConfig::memory()).unwrap();
        init_catalog(&store).unwrap();
        store
    }

    #[test]
    fn test_uninitialized() {
        let store = StoreHandle::open(&StoreConfig::memory()).unwrap();
        assert!(matches!(
            get_tables(&store),
            Err(CatalogError::NotInitialized)
        ));
        assert!(matches!(
            register_table(&store, "orders"),
            Err(CatalogError::NotInitialized)
        ));
    }

    #[test]
    fn test_init_is_idempotent() {
        let store = StoreHandle::open(&StoreConfig::memory()).unwrap();
        assert!(init_catalog(&store).unwrap());
        create_table(&store, "orders").unwrap();

        // A second init must not wipe the directory
        assert!(!init_catalog(&store).unwrap());
        assert_eq!(get_tables(&store).unwrap(), vec!["orders"]);
    }

    #[test]
    fn test_create_preserves_order() {
        let store = new_store();
        assert!(get_tables(&store).unwrap().is_empty());

        assert!(create_table(&store, "orders").unwrap());
        assert_eq!(get_tables(&store).unwrap(), vec!["orders"]);

        assert!(create_table(&store, "users").unwrap());
        assert_eq!(get_tables(&store).unwrap(), vec!["orders", "users"]);
        assert!(table_exists(&store, "users").unwrap());
        assert!(!table_exists(&store, "items").unwrap());
    }

    #[test]
    fn test_create_is_unique() {
        let store = new_store();
        assert!(create_table(&store, "orders").unwrap());
        assert!(!create_table(&store, "orders").unwrap());
        assert!(!create_table(&store, "orders").unwrap());
        assert_eq!(get_tables(&store).unwrap(), vec!["orders"]);
    }

    #[test]
    fn test_stored_format() {
        let store = new_store();
        create_table(&store, "orders").unwrap();
        create_table(&store, "users").unwrap();
        assert_eq!(
            store.engine().get(TABLES_KEY).unwrap(),
            Some(b"orders,users".to_vec())
        );
    }

    #[test]
    fn test_set_tables_overwrites() {
        let store = new_store();
        create_table(&store, "orders").unwrap();
        set_tables(&store, &["users".to_string()]).unwrap();
        assert_eq!(get_tables(&store).unwrap(), vec!["users"]);
    }

    #[test]
    fn test_invalid_names() {
        let store = new_store();
        let too_long = "x".repeat(64);
        for name in ["", "a,b", "a#b", "has space", "bang!", too_long.as_str()] {
            assert!(
                matches!(
                    create_table(&store, name),
                    Err(CatalogError::InvalidTableName { .. })
                ),
                "accepted {:?}",
                name
            );
        }
        assert!(create_table(&store, "public.orders_2024$x").unwrap());
        assert!(create_table(&store, &"x".repeat(63)).unwrap());
    }

    #[test]
    fn test_concurrent_create_distinct_names() {
        let store = Arc::new(new_store());
        let names: Vec<String> = (0..8).map(|i| format!("table_{}", i)).collect();

        std::thread::scope(|s| {
            for name in &names {
                let store = Arc::clone(&store);
                s.spawn(move || create_table(&store, name).unwrap());
            }
        });

        let mut tables = get_tables(&store).unwrap();
        tables.sort();
        assert_eq!(tables, names);
    }

    #[test]
    fn test_concurrent_create_same_name() {
        let store = Arc::new(new_store());
        let added: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let store = Arc::clone(&store);
                    s.spawn(move || create_table(&store, "orders").unwrap())
                })
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });
        assert_eq!(added, 1);
        assert_eq!(get_tables(&store).unwrap(), vec!["orders"]);
    }

    /// Engine that silently discards catalog writes after the first one
    struct LossyEngine {
        inner: MemoryEngine,
        catalog_writes: parking_lot::Mutex<usize>,
    }

    impl StorageEngine for LossyEngine {
        fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
            self.inner.get(key)
        }

        fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
            if key == TABLES_KEY {
                let mut writes = self.catalog_writes.lock();
                *writes += 1;
                if *writes > 1 {
                    return Ok(());
                }
            }
            self.inner.put(key, value)
        }

        fn delete(&self, key: &[u8]) -> StorageResult<()> {
            self.inner.delete(key)
        }

        fn scan(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> StorageResult<Vec<KeyValue>> {
            self.inner.scan(start, end)
        }

        fn flush(&self) -> StorageResult<()> {
            Ok(())
        }

        fn close(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_lost_update_detected() {
        let engine = Arc::new(LossyEngine {
            inner: MemoryEngine::new(),
            catalog_writes: parking_lot::Mutex::new(0),
        });
        let store = StoreHandle::with_engine(engine).unwrap();
        init_catalog(&store).unwrap();

        let err = create_table(&store, "orders").unwrap_err();
        assert!(matches!(err, CatalogError::LostUpdate(ref name) if name == "orders"));
        assert_eq!(err.kind(), ErrorKind::LostCatalogUpdate);
    }

    #[test]
    fn test_data_type_accepts() {
        assert!(DataType::Int.accepts(&Datum::Int(42)));
        assert!(!DataType::Int.accepts(&Datum::Int(i64::MAX)));
        assert!(!DataType::SmallInt.accepts(&Datum::Int(40_000)));
        assert!(DataType::Varchar(3).accepts(&Datum::Text("abc".to_string())));
        assert!(!DataType::Varchar(3).accepts(&Datum::Text("abcd".to_string())));
        assert!(DataType::Text.accepts(&Datum::Null));
        assert!(!DataType::Boolean.accepts(&Datum::Int(1)));
    }
}
