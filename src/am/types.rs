//! Host-side types passed through the access method callbacks

use crate::catalog::DataType;
use crate::executor::{Datum, Row};

/// Host object identifier
pub type Oid = u32;

/// Host transaction identifier
pub type TransactionId = u32;

/// Command id within a transaction
pub type CommandId = u32;

/// Insert option bits (`TABLE_INSERT_*` on the host side)
pub type InsertOptions = u32;

pub const INVALID_OID: Oid = 0;
pub const INVALID_TRANSACTION_ID: TransactionId = 0;

/// Tuple identifier; for this access method it is the row id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tid(pub u64);

/// One column of a relation descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDesc {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDesc {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        ColumnDesc {
            name: name.into(),
            data_type,
        }
    }
}

/// Column layout of a relation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TupleDesc {
    pub columns: Vec<ColumnDesc>,
}

impl TupleDesc {
    pub fn new(columns: Vec<ColumnDesc>) -> Self {
        TupleDesc { columns }
    }

    /// Number of attributes
    pub fn natts(&self) -> usize {
        self.columns.len()
    }
}

/// A table as the host sees it
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub oid: Oid,
    pub name: String,
    pub desc: TupleDesc,
}

impl Relation {
    pub fn new(oid: Oid, name: impl Into<String>, desc: TupleDesc) -> Self {
        Relation {
            oid,
            name: name.into(),
            desc,
        }
    }
}

/// Visibility snapshot; carried through but not interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub xmin: TransactionId,
    pub xmax: TransactionId,
}

/// Scan option bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanFlags(pub u32);

impl ScanFlags {
    pub const SEQSCAN: ScanFlags = ScanFlags(1 << 0);
    pub const BITMAPSCAN: ScanFlags = ScanFlags(1 << 1);
    pub const SAMPLESCAN: ScanFlags = ScanFlags(1 << 2);
    pub const ANALYZE: ScanFlags = ScanFlags(1 << 3);

    pub fn contains(self, other: ScanFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Slot implementation the host should allocate for this access method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Virtual,
    Heap,
    BufferHeap,
    Minimal,
}

/// Outcome of update, delete and lock requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TmResult {
    Ok,
    /// Not performed: the tuple is not visible to this access method
    Invisible,
    SelfModified,
    Updated,
    Deleted,
    BeingModified,
    WouldBlock,
}

/// Row lock strength for `tuple_lock`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    KeyShare,
    Share,
    NoKeyExclusive,
    Exclusive,
}

/// Relation fork addressed by `relation_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkNumber {
    Main,
    FreeSpaceMap,
    VisibilityMap,
    Init,
}

/// Planner size estimate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RelSizeEstimate {
    pub pages: u32,
    pub tuples: f64,
    pub all_visible_frac: f64,
}

/// State of an index-driven fetch
#[derive(Debug)]
pub struct IndexFetch {
    pub relation_oid: Oid,
}

/// Shared state for a parallel scan
#[derive(Debug, Default)]
pub struct ParallelScanDesc {
    pub relation_oid: Oid,
    pub next_row: u64,
}

/// Host tuple slot holding one row's values
#[derive(Debug, Clone, Default)]
pub struct TupleSlot {
    values: Vec<Datum>,
    /// Tid of the row last stored into or inserted from this slot
    pub tid: Option<Tid>,
    empty: bool,
}

impl TupleSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        TupleSlot {
            values: Vec::new(),
            tid: None,
            empty: true,
        }
    }

    /// Create a slot already holding `values`
    pub fn from_values(values: Vec<Datum>) -> Self {
        TupleSlot {
            values,
            tid: None,
            empty: false,
        }
    }

    /// Drop the slot's contents
    pub fn clear(&mut self) {
        self.values.clear();
        self.tid = None;
        self.empty = true;
    }

    /// Store a row as the slot's virtual tuple
    pub fn store_virtual(&mut self, row: Row, tid: Tid) {
        self.values = row.into_values();
        self.tid = Some(tid);
        self.empty = false;
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn values(&self) -> &[Datum] {
        &self.values
    }

    /// Copy the values out as a row
    pub fn to_row(&self) -> Row {
        Row::new(self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_lifecycle() {
        let mut slot = TupleSlot::new();
        assert!(slot.is_empty());

        slot.store_virtual(Row::new(vec![Datum::Int(1)]), Tid(4));
        assert!(!slot.is_empty());
        assert_eq!(slot.values(), &[Datum::Int(1)]);
        assert_eq!(slot.tid, Some(Tid(4)));

        slot.clear();
        assert!(slot.is_empty());
        assert!(slot.values().is_empty());
        assert_eq!(slot.tid, None);
    }

    #[test]
    fn test_scan_flags() {
        let flags = ScanFlags(ScanFlags::SEQSCAN.0 | ScanFlags::ANALYZE.0);
        assert!(flags.contains(ScanFlags::SEQSCAN));
        assert!(!flags.contains(ScanFlags::SAMPLESCAN));
    }
}
