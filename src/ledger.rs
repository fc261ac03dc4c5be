//! Chain ledger
//!
//! Owns the running aggregate table, the slot dedup set, the batch counter
//! and the latest-validated cursor. The discovery engine drives it; the
//! presentation layer only ever sees cloned snapshots taken by the service.

use crate::aggregate::{fold_batch, merge_row, AggregateRow};
use crate::error::TrackerError;
use crate::slot::Slot;
use std::collections::HashSet;

#[derive(Default)]
pub struct ChainLedger {
    /// Running aggregate table, sorted ascending by `Min_Slot_Timestamp`.
    table: Vec<AggregateRow>,
    /// Numbers of every slot folded in this session. No slot is ever
    /// ingested twice.
    seen_slots: HashSet<u64>,
    /// Monotonically increasing batch counter.
    batch_counter: u64,
    /// Highest validated slot number known from the remote source.
    /// Refreshed by the discovery engine, not by the ledger itself.
    latest_validated: u64,
    /// Raw slot buffer, retained unless the caller flushes after folding.
    slots: Vec<Slot>,
}

impl ChainLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a slot unless its number was already ingested. Returns
    /// whether the slot was new.
    pub fn add_slot(&mut self, slot: Slot) -> bool {
        if !self.seen_slots.insert(slot.number()) {
            return false;
        }
        self.slots.push(slot);
        true
    }

    /// Assign the next batch number to a set of slots, record them, fold
    /// the batch into one aggregate row and merge it into the table.
    ///
    /// Already-seen slot numbers are dropped before folding, so re-offering
    /// a batch never double-counts. With `flush_slots` the raw slot buffer
    /// is discarded afterwards to bound memory; the dedup set and the
    /// table survive.
    pub fn add_batch(&mut self, slots: Vec<Slot>, flush_slots: bool) {
        self.batch_counter += 1;
        let batch_number = self.batch_counter;

        let mut added = Vec::new();
        for mut slot in slots {
            slot.set_batch_number(batch_number);
            let number = slot.number();
            if self.add_slot(slot) {
                added.push(number);
            }
        }

        let records: Vec<_> = self
            .slots
            .iter()
            .filter(|s| added.contains(&s.number()))
            .flat_map(|s| s.records())
            .collect();

        if let Some(row) = fold_batch(&records) {
            merge_row(&mut self.table, row);
        }

        if flush_slots {
            self.slots.clear();
        }
    }

    /// The running table, always sorted ascending by `Min_Slot_Timestamp`.
    pub fn table(&self) -> &[AggregateRow] {
        &self.table
    }

    /// Highest `Max_Slot_Number` folded into the table; where discovery
    /// resumes after a restart.
    pub fn cursor(&self) -> Option<u64> {
        self.table.iter().map(|r| r.max_slot_number).max()
    }

    pub fn latest_validated(&self) -> u64 {
        self.latest_validated
    }

    pub fn set_latest_validated(&mut self, slot_number: u64) {
        self.latest_validated = slot_number;
    }

    pub fn batch_counter(&self) -> u64 {
        self.batch_counter
    }

    /// Retained raw slot buffer (empty in bounded-memory mode).
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn is_initialized(&self) -> bool {
        !self.table.is_empty()
    }

    pub fn ensure_initialized(&self) -> Result<(), TrackerError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(TrackerError::NotInitialized)
        }
    }

    /// Replace the table with rows loaded from persistent storage. The
    /// cursor follows the new table; the dedup set and batch counter start
    /// fresh, since no slot at or below the cursor is ever re-probed.
    pub fn restore(&mut self, mut rows: Vec<AggregateRow>) {
        rows.sort_by_key(|r| r.min_slot_timestamp);
        self.table = rows;
        self.slots.clear();
        self.seen_slots.clear();
        self.batch_counter = 0;
    }
}
