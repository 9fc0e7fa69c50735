//! Insert path
//!
//! Row ids come from the table's `RowIdGenerator`, seeded once per store
//! handle from the largest id on disk. Allocation is a single atomic step, so
//! concurrent inserts into one table always get distinct, increasing ids.

use std::ops::Range;
use std::sync::Arc;

use crate::catalog;
use crate::storage::{RowIdGenerator, StoreHandle};

use super::encoding::{decode_row_key, encode_row, encode_row_key, table_key_end, table_key_prefix};
use super::error::{ExecutorError, ExecutorResult};
use super::row::Row;

/// Largest row id stored for a table, `None` when it has no rows
///
/// Scans every key under the table's prefix. Keys that do not parse as row
/// keys are logged and skipped, so one foreign key cannot block inserts.
pub fn max_row_id(store: &StoreHandle, table: &str) -> ExecutorResult<Option<u64>> {
    let prefix = table_key_prefix(table);
    let end = table_key_end(table);

    let mut max = None;
    for (key, _value) in store.engine().scan(Some(&prefix), Some(&end))? {
        match decode_row_key(&key) {
            Ok((_, row_id)) => max = max.max(Some(row_id)),
            Err(e) => tracing::warn!(table, error = %e, "skipping malformed row key"),
        }
    }
    Ok(max)
}

fn ids_exhausted(table: &str) -> ExecutorError {
    ExecutorError::Encoding(format!("row ids exhausted in {}", table))
}

/// Get the table's row id generator, seeding it on first use
pub fn row_id_generator(store: &StoreHandle, table: &str) -> ExecutorResult<Arc<RowIdGenerator>> {
    store.row_ids().get_or_seed::<ExecutorError>(table, || {
        if !catalog::table_exists(store, table)? {
            return Err(ExecutorError::TableNotFound(table.to_string()));
        }
        match max_row_id(store, table)? {
            None => Ok(0),
            Some(max) => max.checked_add(1).ok_or_else(|| ids_exhausted(table)),
        }
    })
}

/// Write an encoded row under a freshly allocated id
fn write_row(store: &StoreHandle, table: &str, row_id: u64, value: &[u8]) -> ExecutorResult<()> {
    let key = encode_row_key(table, row_id);
    if store.engine().get(&key)?.is_some() {
        tracing::warn!(table, row_id, "allocated row id already stored");
        return Err(ExecutorError::DuplicateRowId {
            table: table.to_string(),
            row_id,
        });
    }
    store.engine().put(&key, value)?;
    Ok(())
}

/// Append one row to a table
///
/// Returns the row id assigned to it.
pub fn insert_row(store: &StoreHandle, table: &str, row: &Row) -> ExecutorResult<u64> {
    let gen = row_id_generator(store, table)?;
    let value = encode_row(row)?;

    let row_id = gen.next().ok_or_else(|| ids_exhausted(table))?;
    write_row(store, table, row_id, &value)?;

    tracing::debug!(table, row_id, columns = row.len(), "inserted row");
    Ok(row_id)
}

/// Append several rows to a table
///
/// Allocates all ids with one atomic step and returns the allocated range;
/// the i-th row is stored under `range.start + i`.
pub fn insert_rows(store: &StoreHandle, table: &str, rows: &[Row]) -> ExecutorResult<Range<u64>> {
    if rows.is_empty() {
        return Ok(0..0);
    }

    let gen = row_id_generator(store, table)?;
    let values = rows.iter().map(encode_row).collect::<ExecutorResult<Vec<_>>>()?;

    let count = values.len() as u64;
    let start = gen
        .allocate_batch(count)
        .ok_or_else(|| ids_exhausted(table))?;
    for (row_id, value) in (start..).zip(&values) {
        write_row(store, table, row_id, value)?;
    }

    tracing::debug!(table, start, count, "inserted rows");
    Ok(start..start + count)
}
