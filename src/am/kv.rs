//! Access method over the key-value store

use std::sync::Arc;

use crate::catalog;
use crate::executor::insert::row_id_generator;
use crate::executor::{
    fetch_row, insert_row, insert_rows, ExecutorError, ExecutorResult, Row, ScanCursor,
    ScanDirection, ScanKey,
};
use crate::storage::{StoreConfig, StoreHandle};

use super::types::{
    CommandId, ForkNumber, IndexFetch, InsertOptions, LockMode, Oid, ParallelScanDesc, Relation,
    RelSizeEstimate, ScanFlags, SlotKind, Snapshot, Tid, TmResult, TransactionId, TupleSlot,
    INVALID_OID, INVALID_TRANSACTION_ID,
};
use super::TableAccessMethod;

/// Table access method storing rows in a `StoreHandle`
pub struct KvTableAm {
    store: Arc<StoreHandle>,
}

impl KvTableAm {
    /// Open the store described by `config` and make sure the catalog exists
    pub fn open(config: &StoreConfig) -> ExecutorResult<Self> {
        let store = StoreHandle::open(config)?;
        catalog::init_catalog(&store)?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Wrap a store whose catalog is already initialized
    pub fn new(store: Arc<StoreHandle>) -> Self {
        KvTableAm { store }
    }

    pub fn store(&self) -> &Arc<StoreHandle> {
        &self.store
    }
}

/// Check a slot against the relation descriptor and copy out its row
fn slot_to_row(relation: &Relation, slot: &TupleSlot) -> ExecutorResult<Row> {
    if slot.is_empty() {
        return Err(ExecutorError::InvalidArgument(format!(
            "empty slot for relation {}",
            relation.name
        )));
    }

    let natts = relation.desc.natts();
    if slot.values().len() != natts {
        return Err(ExecutorError::InvalidArgument(format!(
            "slot has {} values, relation {} has {} columns",
            slot.values().len(),
            relation.name,
            natts
        )));
    }

    for (column, value) in relation.desc.columns.iter().zip(slot.values()) {
        match value.data_type() {
            Some(got) if !column.data_type.accepts(value) => {
                return Err(ExecutorError::TypeMismatch {
                    column: column.name.clone(),
                    expected: column.data_type,
                    got,
                });
            }
            _ => {}
        }
    }

    Ok(slot.to_row())
}

impl TableAccessMethod for KvTableAm {
    fn slot_callbacks(&self, relation: &Relation) -> SlotKind {
        tracing::trace!(relation = %relation.name, "slot_callbacks");
        SlotKind::Virtual
    }

    fn scan_begin(
        &self,
        relation: &Relation,
        _snapshot: &Snapshot,
        keys: Vec<ScanKey>,
        flags: ScanFlags,
    ) -> ExecutorResult<ScanCursor> {
        tracing::trace!(relation = %relation.name, flags = flags.0, nkeys = keys.len(), "scan_begin");
        ScanCursor::begin(
            Arc::clone(&self.store),
            &relation.name,
            keys,
            Some(relation.desc.natts()),
        )
    }

    fn scan_rescan(
        &self,
        scan: &mut ScanCursor,
        keys: Option<Vec<ScanKey>>,
    ) -> ExecutorResult<()> {
        tracing::trace!(relation = scan.table(), "scan_rescan");
        scan.rescan(keys)
    }

    fn scan_getnextslot(
        &self,
        scan: &mut ScanCursor,
        direction: ScanDirection,
        slot: &mut TupleSlot,
    ) -> ExecutorResult<bool> {
        tracing::trace!(relation = scan.table(), position = scan.position(), "scan_getnextslot");
        slot.clear();
        match scan.next(direction) {
            None => Ok(false),
            Some(Ok((row_id, row))) => {
                slot.store_virtual(row, Tid(row_id));
                Ok(true)
            }
            Some(Err(e)) => Err(e),
        }
    }

    fn scan_end(&self, mut scan: ScanCursor) {
        tracing::trace!(relation = scan.table(), "scan_end");
        scan.end();
    }

    fn parallelscan_estimate(&self, relation: &Relation) -> usize {
        tracing::trace!(relation = %relation.name, "parallelscan_estimate");
        0
    }

    fn parallelscan_initialize(&self, relation: &Relation, _pscan: &mut ParallelScanDesc) -> usize {
        tracing::trace!(relation = %relation.name, "parallelscan_initialize");
        0
    }

    fn parallelscan_reinitialize(&self, relation: &Relation, _pscan: &mut ParallelScanDesc) {
        tracing::trace!(relation = %relation.name, "parallelscan_reinitialize");
    }

    fn index_fetch_begin(&self, relation: &Relation) -> Option<IndexFetch> {
        tracing::trace!(relation = %relation.name, "index_fetch_begin");
        None
    }

    fn index_fetch_reset(&self, fetch: &mut IndexFetch) {
        tracing::trace!(relation_oid = fetch.relation_oid, "index_fetch_reset");
    }

    fn index_fetch_end(&self, fetch: IndexFetch) {
        tracing::trace!(relation_oid = fetch.relation_oid, "index_fetch_end");
    }

    fn index_fetch_tuple(
        &self,
        fetch: &mut IndexFetch,
        tid: Tid,
        _snapshot: &Snapshot,
        _slot: &mut TupleSlot,
    ) -> bool {
        tracing::trace!(relation_oid = fetch.relation_oid, tid = tid.0, "index_fetch_tuple");
        false
    }

    fn tuple_insert(
        &self,
        relation: &Relation,
        slot: &mut TupleSlot,
        _cid: CommandId,
        _options: InsertOptions,
    ) -> ExecutorResult<()> {
        tracing::trace!(relation = %relation.name, "tuple_insert");
        let row = slot_to_row(relation, slot)?;
        let row_id = insert_row(&self.store, &relation.name, &row)?;
        slot.tid = Some(Tid(row_id));
        Ok(())
    }

    fn tuple_insert_speculative(
        &self,
        relation: &Relation,
        _slot: &mut TupleSlot,
        _cid: CommandId,
        _options: InsertOptions,
        spec_token: u32,
    ) {
        tracing::trace!(relation = %relation.name, spec_token, "tuple_insert_speculative");
    }

    fn tuple_complete_speculative(
        &self,
        relation: &Relation,
        _slot: &mut TupleSlot,
        spec_token: u32,
        succeeded: bool,
    ) {
        tracing::trace!(relation = %relation.name, spec_token, succeeded, "tuple_complete_speculative");
    }

    fn multi_insert(
        &self,
        relation: &Relation,
        slots: &mut [TupleSlot],
        _cid: CommandId,
        _options: InsertOptions,
    ) -> ExecutorResult<()> {
        tracing::trace!(relation = %relation.name, count = slots.len(), "multi_insert");
        let rows = slots
            .iter()
            .map(|slot| slot_to_row(relation, slot))
            .collect::<ExecutorResult<Vec<_>>>()?;

        let row_ids = insert_rows(&self.store, &relation.name, &rows)?;
        for (slot, row_id) in slots.iter_mut().zip(row_ids) {
            slot.tid = Some(Tid(row_id));
        }
        Ok(())
    }

    fn tuple_delete(
        &self,
        relation: &Relation,
        tid: Tid,
        _cid: CommandId,
        _snapshot: &Snapshot,
        _wait: bool,
    ) -> TmResult {
        tracing::trace!(relation = %relation.name, tid = tid.0, "tuple_delete");
        TmResult::Invisible
    }

    fn tuple_update(
        &self,
        relation: &Relation,
        otid: Tid,
        _slot: &mut TupleSlot,
        _cid: CommandId,
        _snapshot: &Snapshot,
        _wait: bool,
    ) -> TmResult {
        tracing::trace!(relation = %relation.name, tid = otid.0, "tuple_update");
        TmResult::Invisible
    }

    fn tuple_lock(
        &self,
        relation: &Relation,
        tid: Tid,
        _snapshot: &Snapshot,
        _slot: &mut TupleSlot,
        _cid: CommandId,
        mode: LockMode,
    ) -> TmResult {
        tracing::trace!(relation = %relation.name, tid = tid.0, ?mode, "tuple_lock");
        TmResult::Invisible
    }

    fn tuple_fetch_row_version(
        &self,
        relation: &Relation,
        tid: Tid,
        _snapshot: &Snapshot,
        slot: &mut TupleSlot,
    ) -> ExecutorResult<bool> {
        tracing::trace!(relation = %relation.name, tid = tid.0, "tuple_fetch_row_version");
        slot.clear();
        match fetch_row(&self.store, &relation.name, tid.0, Some(relation.desc.natts())) {
            Ok(row) => {
                slot.store_virtual(row, tid);
                Ok(true)
            }
            Err(ExecutorError::RowNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn tuple_get_latest_tid(&self, scan: &ScanCursor, tid: &mut Tid) {
        tracing::trace!(relation = scan.table(), tid = tid.0, "tuple_get_latest_tid");
    }

    fn tuple_tid_valid(&self, scan: &ScanCursor, tid: Tid) -> bool {
        tracing::trace!(relation = scan.table(), tid = tid.0, "tuple_tid_valid");
        row_id_generator(&self.store, scan.table())
            .map(|gen| gen.is_allocated(tid.0))
            .unwrap_or(false)
    }

    fn tuple_satisfies_snapshot(
        &self,
        relation: &Relation,
        _slot: &TupleSlot,
        _snapshot: &Snapshot,
    ) -> bool {
        tracing::trace!(relation = %relation.name, "tuple_satisfies_snapshot");
        true
    }

    fn index_delete_tuples(&self, relation: &Relation) -> TransactionId {
        tracing::trace!(relation = %relation.name, "index_delete_tuples");
        INVALID_TRANSACTION_ID
    }

    fn relation_set_new_filelocator(&self, relation: &Relation) -> ExecutorResult<()> {
        tracing::trace!(relation = %relation.name, "relation_set_new_filelocator");
        catalog::create_table(&self.store, &relation.name)?;
        Ok(())
    }

    fn relation_nontransactional_truncate(&self, relation: &Relation) {
        tracing::trace!(relation = %relation.name, "relation_nontransactional_truncate");
    }

    fn relation_copy_data(&self, relation: &Relation, new_oid: Oid) {
        tracing::trace!(relation = %relation.name, new_oid, "relation_copy_data");
    }

    fn relation_copy_for_cluster(&self, old: &Relation, new: &Relation) {
        tracing::trace!(old = %old.name, new = %new.name, "relation_copy_for_cluster");
    }

    fn relation_vacuum(&self, relation: &Relation) {
        tracing::trace!(relation = %relation.name, "relation_vacuum");
    }

    fn scan_analyze_next_block(&self, scan: &mut ScanCursor) -> bool {
        tracing::trace!(relation = scan.table(), "scan_analyze_next_block");
        false
    }

    fn scan_analyze_next_tuple(&self, scan: &mut ScanCursor, _slot: &mut TupleSlot) -> bool {
        tracing::trace!(relation = scan.table(), "scan_analyze_next_tuple");
        false
    }

    fn index_build_range_scan(&self, table: &Relation, index: &Relation) -> f64 {
        tracing::trace!(relation = %table.name, index = %index.name, "index_build_range_scan");
        0.0
    }

    fn index_validate_scan(&self, table: &Relation, index: &Relation, _snapshot: &Snapshot) {
        tracing::trace!(relation = %table.name, index = %index.name, "index_validate_scan");
    }

    fn relation_size(&self, relation: &Relation, fork: ForkNumber) -> u64 {
        tracing::trace!(relation = %relation.name, ?fork, "relation_size");
        0
    }

    fn relation_needs_toast_table(&self, relation: &Relation) -> bool {
        tracing::trace!(relation = %relation.name, "relation_needs_toast_table");
        false
    }

    fn relation_toast_am(&self, relation: &Relation) -> Oid {
        tracing::trace!(relation = %relation.name, "relation_toast_am");
        INVALID_OID
    }

    fn relation_fetch_toast_slice(
        &self,
        toast: &Relation,
        value_id: Oid,
        offset: usize,
        length: usize,
        _result: &mut Vec<u8>,
    ) {
        tracing::trace!(relation = %toast.name, value_id, offset, length, "relation_fetch_toast_slice");
    }

    fn relation_estimate_size(&self, relation: &Relation) -> RelSizeEstimate {
        tracing::trace!(relation = %relation.name, "relation_estimate_size");
        RelSizeEstimate::default()
    }

    fn scan_sample_next_block(&self, scan: &mut ScanCursor) -> bool {
        tracing::trace!(relation = scan.table(), "scan_sample_next_block");
        false
    }

    fn scan_sample_next_tuple(&self, scan: &mut ScanCursor, _slot: &mut TupleSlot) -> bool {
        tracing::trace!(relation = scan.table(), "scan_sample_next_tuple");
        false
    }
}
