//! Executor error types

use std::fmt;

use crate::catalog::{CatalogError, DataType};
use crate::storage::StorageError;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Coarse error classes reported to the host engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Store closed, not openable, or failing I/O
    StoreUnavailable,
    /// Catalog, table, or row absent
    NotFound,
    /// Stored value does not parse into the expected columns
    DecodeError,
    /// Row id already present under the allocated key
    DuplicateRowId,
    /// Catalog write did not survive a concurrent writer
    LostCatalogUpdate,
    /// Caller supplied a bad name, row shape, or value type
    InvalidArgument,
}

/// Executor errors
#[derive(Debug)]
pub enum ExecutorError {
    /// Storage layer error
    Storage(StorageError),

    /// Catalog error
    Catalog(CatalogError),

    /// Table not found
    TableNotFound(String),

    /// Row not found
    RowNotFound { table: String, row_id: u64 },

    /// Encoding/decoding error
    Encoding(String),

    /// Stored or supplied row has the wrong number of columns
    ColumnCountMismatch { expected: usize, got: usize },

    /// Value does not fit the column type
    TypeMismatch {
        column: String,
        expected: DataType,
        got: DataType,
    },

    /// Allocated row id already exists in storage
    DuplicateRowId { table: String, row_id: u64 },

    /// Host passed a slot that does not fit the relation
    InvalidArgument(String),
}

impl ExecutorError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutorError::Storage(_) => ErrorKind::StoreUnavailable,
            ExecutorError::Catalog(e) => e.kind(),
            ExecutorError::TableNotFound(_) | ExecutorError::RowNotFound { .. } => {
                ErrorKind::NotFound
            }
            ExecutorError::Encoding(_) | ExecutorError::ColumnCountMismatch { .. } => {
                ErrorKind::DecodeError
            }
            ExecutorError::TypeMismatch { .. } | ExecutorError::InvalidArgument(_) => {
                ErrorKind::InvalidArgument
            }
            ExecutorError::DuplicateRowId { .. } => ErrorKind::DuplicateRowId,
        }
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorError::Storage(e) => write!(f, "storage error: {}", e),
            ExecutorError::Catalog(e) => write!(f, "catalog error: {}", e),
            ExecutorError::TableNotFound(name) => write!(f, "table not found: {}", name),
            ExecutorError::RowNotFound { table, row_id } => {
                write!(f, "row {} not found in table {}", row_id, table)
            }
            ExecutorError::Encoding(msg) => write!(f, "encoding error: {}", msg),
            ExecutorError::ColumnCountMismatch { expected, got } => {
                write!(f, "expected {} columns, got {}", expected, got)
            }
            ExecutorError::TypeMismatch {
                column,
                expected,
                got,
            } => {
                write!(
                    f,
                    "type mismatch in column {}: expected {:?}, got {:?}",
                    column, expected, got
                )
            }
            ExecutorError::DuplicateRowId { table, row_id } => {
                write!(f, "row id {} already exists in table {}", row_id, table)
            }
            ExecutorError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecutorError::Storage(e) => Some(e),
            ExecutorError::Catalog(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for ExecutorError {
    fn from(e: StorageError) -> Self {
        ExecutorError::Storage(e)
    }
}

impl From<CatalogError> for ExecutorError {
    fn from(e: CatalogError) -> Self {
        ExecutorError::Catalog(e)
    }
}
