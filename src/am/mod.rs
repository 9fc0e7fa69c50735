//! Table access method
//!
//! `TableAccessMethod` has one method per callback the host engine invokes on
//! a table stored through this crate. `KvTableAm` implements it over a shared
//! `StoreHandle`; `kv_tableam_handler` is the registration entry point.
//!
//! Only the callbacks needed to create, insert into, and scan tables do real
//! work. The rest answer with conservative defaults: no index support, no
//! updates or deletes, zero size estimates.

mod handler;
mod kv;
pub mod types;

pub use handler::kv_tableam_handler;
pub use kv::KvTableAm;
pub use types::{
    ColumnDesc, CommandId, ForkNumber, IndexFetch, InsertOptions, LockMode, Oid,
    ParallelScanDesc, Relation, RelSizeEstimate, ScanFlags, SlotKind, Snapshot, Tid, TmResult,
    TransactionId, TupleDesc, TupleSlot, INVALID_OID, INVALID_TRANSACTION_ID,
};

use crate::executor::{ExecutorResult, ScanCursor, ScanDirection, ScanKey};

/// Callbacks the host engine invokes on tables of this access method
pub trait TableAccessMethod: Send + Sync {
    // Slot

    /// Kind of slot rows are produced into
    fn slot_callbacks(&self, relation: &Relation) -> SlotKind;

    // Sequential scan

    /// Start a scan over a snapshot of the relation
    fn scan_begin(
        &self,
        relation: &Relation,
        snapshot: &Snapshot,
        keys: Vec<ScanKey>,
        flags: ScanFlags,
    ) -> ExecutorResult<ScanCursor>;

    /// Restart a scan, optionally with new keys
    fn scan_rescan(&self, scan: &mut ScanCursor, keys: Option<Vec<ScanKey>>)
        -> ExecutorResult<()>;

    /// Store the next row into `slot`; `false` once the scan is exhausted
    fn scan_getnextslot(
        &self,
        scan: &mut ScanCursor,
        direction: ScanDirection,
        slot: &mut TupleSlot,
    ) -> ExecutorResult<bool>;

    /// Finish a scan
    fn scan_end(&self, scan: ScanCursor);

    // Parallel scan

    fn parallelscan_estimate(&self, relation: &Relation) -> usize;
    fn parallelscan_initialize(&self, relation: &Relation, pscan: &mut ParallelScanDesc) -> usize;
    fn parallelscan_reinitialize(&self, relation: &Relation, pscan: &mut ParallelScanDesc);

    // Index fetch

    fn index_fetch_begin(&self, relation: &Relation) -> Option<IndexFetch>;
    fn index_fetch_reset(&self, fetch: &mut IndexFetch);
    fn index_fetch_end(&self, fetch: IndexFetch);
    fn index_fetch_tuple(
        &self,
        fetch: &mut IndexFetch,
        tid: Tid,
        snapshot: &Snapshot,
        slot: &mut TupleSlot,
    ) -> bool;

    // Modification

    /// Insert the slot's row; the assigned tid is stored into `slot.tid`
    fn tuple_insert(
        &self,
        relation: &Relation,
        slot: &mut TupleSlot,
        cid: CommandId,
        options: InsertOptions,
    ) -> ExecutorResult<()>;

    fn tuple_insert_speculative(
        &self,
        relation: &Relation,
        slot: &mut TupleSlot,
        cid: CommandId,
        options: InsertOptions,
        spec_token: u32,
    );

    fn tuple_complete_speculative(
        &self,
        relation: &Relation,
        slot: &mut TupleSlot,
        spec_token: u32,
        succeeded: bool,
    );

    /// Insert several rows at once
    fn multi_insert(
        &self,
        relation: &Relation,
        slots: &mut [TupleSlot],
        cid: CommandId,
        options: InsertOptions,
    ) -> ExecutorResult<()>;

    fn tuple_delete(
        &self,
        relation: &Relation,
        tid: Tid,
        cid: CommandId,
        snapshot: &Snapshot,
        wait: bool,
    ) -> TmResult;

    fn tuple_update(
        &self,
        relation: &Relation,
        otid: Tid,
        slot: &mut TupleSlot,
        cid: CommandId,
        snapshot: &Snapshot,
        wait: bool,
    ) -> TmResult;

    fn tuple_lock(
        &self,
        relation: &Relation,
        tid: Tid,
        snapshot: &Snapshot,
        slot: &mut TupleSlot,
        cid: CommandId,
        mode: LockMode,
    ) -> TmResult;

    // Row versions

    /// Fetch the row at `tid` into `slot`; `false` when there is none
    fn tuple_fetch_row_version(
        &self,
        relation: &Relation,
        tid: Tid,
        snapshot: &Snapshot,
        slot: &mut TupleSlot,
    ) -> ExecutorResult<bool>;

    fn tuple_get_latest_tid(&self, scan: &ScanCursor, tid: &mut Tid);

    /// Whether `tid` was ever allocated for the scanned table
    fn tuple_tid_valid(&self, scan: &ScanCursor, tid: Tid) -> bool;

    fn tuple_satisfies_snapshot(
        &self,
        relation: &Relation,
        slot: &TupleSlot,
        snapshot: &Snapshot,
    ) -> bool;

    fn index_delete_tuples(&self, relation: &Relation) -> TransactionId;

    // DDL

    /// Called when a relation is created; registers the table
    fn relation_set_new_filelocator(&self, relation: &Relation) -> ExecutorResult<()>;
    fn relation_nontransactional_truncate(&self, relation: &Relation);
    fn relation_copy_data(&self, relation: &Relation, new_oid: Oid);
    fn relation_copy_for_cluster(&self, old: &Relation, new: &Relation);
    fn relation_vacuum(&self, relation: &Relation);

    fn scan_analyze_next_block(&self, scan: &mut ScanCursor) -> bool;
    fn scan_analyze_next_tuple(&self, scan: &mut ScanCursor, slot: &mut TupleSlot) -> bool;

    fn index_build_range_scan(&self, table: &Relation, index: &Relation) -> f64;
    fn index_validate_scan(&self, table: &Relation, index: &Relation, snapshot: &Snapshot);

    // Miscellaneous

    fn relation_size(&self, relation: &Relation, fork: ForkNumber) -> u64;
    fn relation_needs_toast_table(&self, relation: &Relation) -> bool;
    fn relation_toast_am(&self, relation: &Relation) -> Oid;
    fn relation_fetch_toast_slice(
        &self,
        toast: &Relation,
        value_id: Oid,
        offset: usize,
        length: usize,
        result: &mut Vec<u8>,
    );

    // Planner

    fn relation_estimate_size(&self, relation: &Relation) -> RelSizeEstimate;

    // Sample scan

    fn scan_sample_next_block(&self, scan: &mut ScanCursor) -> bool;
    fn scan_sample_next_tuple(&self, scan: &mut ScanCursor, slot: &mut TupleSlot) -> bool;
}
