//! Row-level table operations
//!
//! Maps table rows onto the key-value store: key and value encoding, the
//! insert path with per-table row id allocation, and snapshot scans.

pub mod datum;
pub mod encoding;
pub mod error;
pub mod insert;
pub mod row;
pub mod scan;

pub use datum::Datum;
pub use error::{ErrorKind, ExecutorError, ExecutorResult};
pub use insert::{insert_row, insert_rows, max_row_id};
pub use row::Row;
pub use scan::{fetch_row, ScanCursor, ScanDirection, ScanKey};
