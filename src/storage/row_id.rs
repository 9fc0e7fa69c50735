//! Per-table row ID allocation
//!
//! Each table gets its own counter. A counter is seeded once per store
//! handle from the largest row id already on disk and from then on hands out
//! ids with a single atomic step, so concurrent inserts never share an id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Row ID generator for one table
pub struct RowIdGenerator {
    /// Next id to hand out
    next_id: AtomicU64,
}

impl RowIdGenerator {
    /// Create a new row ID generator starting at 0
    pub const fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
        }
    }

    /// Create a row ID generator starting at a specific value
    ///
    /// Used when a table already has rows on disk.
    pub const fn starting_at(start: u64) -> Self {
        Self {
            next_id: AtomicU64::new(start),
        }
    }

    /// Allocate the next row ID
    ///
    /// Returns `None` once the id space is used up; ids never wrap.
    #[inline]
    pub fn next(&self) -> Option<u64> {
        self.allocate_batch(1)
    }

    /// Allocate a batch of row IDs
    ///
    /// Returns the start of the allocated range. The caller owns IDs from
    /// `start` to `start + count - 1` (inclusive). `u64::MAX` itself is never
    /// handed out, so `start + count` cannot overflow.
    #[inline]
    pub fn allocate_batch(&self, count: u64) -> Option<u64> {
        self.next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| {
                next.checked_add(count)
            })
            .ok()
    }

    /// Get the current counter value (the next id to be handed out)
    pub fn current(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Whether `row_id` has been handed out by this generator or its seed
    pub fn is_allocated(&self, row_id: u64) -> bool {
        row_id < self.current()
    }
}

impl Default for RowIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Table name -> generator registry owned by a store handle
#[derive(Default)]
pub struct RowIdRegistry {
    generators: Mutex<HashMap<String, Arc<RowIdGenerator>>>,
}

impl RowIdRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the table's generator, seeding it on first use
    ///
    /// `seed` returns the first free row id. The registry lock is held while
    /// it runs, so a table is seeded at most once.
    pub fn get_or_seed<E>(
        &self,
        table: &str,
        seed: impl FnOnce() -> Result<u64, E>,
    ) -> Result<Arc<RowIdGenerator>, E> {
        let mut generators = self.generators.lock();
        if let Some(gen) = generators.get(table) {
            return Ok(Arc::clone(gen));
        }

        let start = seed()?;
        tracing::debug!(table, start, "seeded row id generator");
        let gen = Arc::new(RowIdGenerator::starting_at(start));
        generators.insert(table.to_string(), Arc::clone(&gen));
        Ok(gen)
    }

    /// Get the table's generator if it has been seeded
    pub fn get(&self, table: &str) -> Option<Arc<RowIdGenerator>> {
        self.generators.lock().get(table).cloned()
    }
}
