//! Table scan
//!
//! A `ScanCursor` materializes every `(row id, encoded value)` pair of a table
//! when it begins and decodes rows lazily as the caller advances. Rows written
//! after `begin` are not seen until `rescan`.

use std::sync::Arc;

use crate::catalog;
use crate::storage::StoreHandle;

use super::datum::Datum;
use super::encoding::{
    decode_row, decode_row_checked, decode_row_key, encode_row_key, table_key_end,
    table_key_prefix,
};
use super::error::{ExecutorError, ExecutorResult};
use super::row::Row;

/// Direction a cursor is advanced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanDirection {
    #[default]
    Forward,
    Backward,
}

/// Equality filter on one column position
#[derive(Debug, Clone, PartialEq)]
pub struct ScanKey {
    pub column: usize,
    pub value: Datum,
}

impl ScanKey {
    pub fn new(column: usize, value: impl Into<Datum>) -> Self {
        ScanKey {
            column,
            value: value.into(),
        }
    }

    fn matches(&self, row: &Row) -> bool {
        row.get(self.column) == Some(&self.value)
    }
}

/// Cursor over a snapshot of one table
///
/// The cursor sits on a row the way a host cursor does: `Forward` steps to
/// the next row, `Backward` to the previous one. Switching direction steps
/// back over the row just returned. A scan whose first call is `Backward`
/// starts after the last row.
pub struct ScanCursor {
    /// Store the snapshot was taken from
    store: Arc<StoreHandle>,
    /// Table name
    table: String,
    /// Equality filters, all must match
    keys: Vec<ScanKey>,
    /// Expected column count, checked on decode when set
    arity: Option<usize>,
    /// Raw `(key, value)` pairs in key order, which is row id order
    rows: Vec<(Vec<u8>, Vec<u8>)>,
    /// 0 before the first row, `i + 1` on row `i`, `len + 1` past the last
    position: usize,
    /// Whether `next` has been called since begin or rescan
    started: bool,
}

impl ScanCursor {
    /// Start a scan of `table`
    pub fn begin(
        store: Arc<StoreHandle>,
        table: &str,
        keys: Vec<ScanKey>,
        arity: Option<usize>,
    ) -> ExecutorResult<Self> {
        let rows = snapshot(&store, table)?;
        Ok(ScanCursor {
            store,
            table: table.to_string(),
            keys,
            arity,
            rows,
            position: 0,
            started: false,
        })
    }

    /// Table being scanned
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Number of rows in the snapshot, before filtering
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row the cursor is on, counted from 1; 0 before the first row
    ///
    /// Never exceeds `len()`.
    pub fn position(&self) -> usize {
        self.position.min(self.rows.len())
    }

    /// Step one row in `direction`, returning the index of the row now under
    /// the cursor
    fn step(&mut self, direction: ScanDirection) -> Option<usize> {
        let past_end = self.rows.len() + 1;
        if !self.started {
            self.started = true;
            if direction == ScanDirection::Backward {
                self.position = past_end;
            }
        }

        match direction {
            ScanDirection::Forward => self.position = (self.position + 1).min(past_end),
            ScanDirection::Backward => self.position = self.position.saturating_sub(1),
        }
        if self.position == 0 || self.position == past_end {
            None
        } else {
            Some(self.position - 1)
        }
    }

    /// Return the next matching row in `direction`
    ///
    /// A row whose key or value fails to decode is returned as an error; the
    /// cursor is already on it, so calling `next` again continues the scan.
    pub fn next(&mut self, direction: ScanDirection) -> Option<ExecutorResult<(u64, Row)>> {
        while let Some(index) = self.step(direction) {
            let (key, value) = &self.rows[index];
            let decoded = decode_row_key(key)
                .and_then(|(_, row_id)| Ok((row_id, decode_value(value, self.arity)?)));
            let (row_id, row) = match decoded {
                Ok(decoded) => decoded,
                Err(e) => {
                    tracing::warn!(
                        table = %self.table,
                        key = %String::from_utf8_lossy(key),
                        error = %e,
                        "undecodable row"
                    );
                    return Some(Err(e));
                }
            };

            if self.keys.iter().all(|k| k.matches(&row)) {
                return Some(Ok((row_id, row)));
            }
        }
        None
    }

    /// Restart the scan over a fresh snapshot
    ///
    /// Keeps the current keys unless new ones are given.
    pub fn rescan(&mut self, keys: Option<Vec<ScanKey>>) -> ExecutorResult<()> {
        if let Some(keys) = keys {
            self.keys = keys;
        }
        self.rows = snapshot(&self.store, &self.table)?;
        self.position = 0;
        self.started = false;
        Ok(())
    }

    /// Release the snapshot
    pub fn end(&mut self) {
        self.rows = Vec::new();
        self.position = 0;
        self.started = false;
    }
}

/// Read the raw rows of a table
///
/// Keys are zero padded, so engine order is row id order. Keys are decoded
/// by `next`, one row at a time.
fn snapshot(store: &StoreHandle, table: &str) -> ExecutorResult<Vec<(Vec<u8>, Vec<u8>)>> {
    if !catalog::table_exists(store, table)? {
        return Err(ExecutorError::TableNotFound(table.to_string()));
    }

    let prefix = table_key_prefix(table);
    let end = table_key_end(table);
    let rows = store.engine().scan(Some(&prefix), Some(&end))?;

    tracing::debug!(table, rows = rows.len(), "materialized scan");
    Ok(rows)
}

fn decode_value(value: &[u8], arity: Option<usize>) -> ExecutorResult<Row> {
    match arity {
        Some(arity) => decode_row_checked(value, arity),
        None => decode_row(value),
    }
}

/// Point read of one row
pub fn fetch_row(
    store: &StoreHandle,
    table: &str,
    row_id: u64,
    arity: Option<usize>,
) -> ExecutorResult<Row> {
    let value = store
        .engine()
        .get(&encode_row_key(table, row_id))?
        .ok_or_else(|| ExecutorError::RowNotFound {
            table: table.to_string(),
            row_id,
        })?;
    decode_value(&value, arity)
}
