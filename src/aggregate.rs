//! Aggregation engine
//!
//! Folds one batch of classified transactions into a single canonical
//! count row and merges rows into the running table.
//!
//! The canonical schema is fixed: every row carries every column, with
//! zeros for categories the batch never produced. Types observed outside
//! the canonical set (UpdatePrice, BPF, Scan, Oracle) still count toward
//! the status totals but get no column of their own.

use crate::classifier::{TxStatus, TxType};
use crate::error::TrackerError;
use crate::slot::TxRecord;
use std::collections::HashMap;

/// Types that own a column triplet (Type_/Success_/Failed_) in the
/// canonical schema, in column order.
pub const CANONICAL_TYPES: [TxType; 6] = [
    TxType::CancelOrder,
    TxType::ComputeBudget,
    TxType::System,
    TxType::Transaction,
    TxType::Unknown,
    TxType::Vote,
];

/// Exact column order of the persisted table.
pub const COLUMNS: [&str; 23] = [
    "Min_Slot_Timestamp",
    "Max_Slot_Number",
    "Type_CancelOrder",
    "Type_ComputeBudget",
    "Type_System",
    "Type_Transaction",
    "Type_Unknown",
    "Type_Vote",
    "Success_CancelOrder",
    "Success_ComputeBudget",
    "Success_System",
    "Success_Transaction",
    "Success_Unknown",
    "Success_Vote",
    "Failed_CancelOrder",
    "Failed_ComputeBudget",
    "Failed_System",
    "Failed_Transaction",
    "Failed_Unknown",
    "Failed_Vote",
    "Status_Failed",
    "Status_Success",
    "Total",
];

/// One time-bucketed summary row, keyed by its batch's earliest slot
/// timestamp and highest slot number.
///
/// The count arrays run parallel to [`CANONICAL_TYPES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub min_slot_timestamp: i64,
    pub max_slot_number: u64,
    pub type_counts: [u64; 6],
    pub success_counts: [u64; 6],
    pub failed_counts: [u64; 6],
    pub status_failed: u64,
    pub status_success: u64,
    pub total: u64,
}

impl AggregateRow {
    fn zeroed(min_slot_timestamp: i64, max_slot_number: u64) -> Self {
        Self {
            min_slot_timestamp,
            max_slot_number,
            type_counts: [0; 6],
            success_counts: [0; 6],
            failed_counts: [0; 6],
            status_failed: 0,
            status_success: 0,
            total: 0,
        }
    }

    /// Count column for a canonical type, `None` for non-canonical types.
    pub fn type_count(&self, tx_type: TxType) -> Option<u64> {
        canonical_index(tx_type).map(|i| self.type_counts[i])
    }

    pub fn success_count(&self, tx_type: TxType) -> Option<u64> {
        canonical_index(tx_type).map(|i| self.success_counts[i])
    }

    pub fn failed_count(&self, tx_type: TxType) -> Option<u64> {
        canonical_index(tx_type).map(|i| self.failed_counts[i])
    }
}

fn canonical_index(tx_type: TxType) -> Option<usize> {
    CANONICAL_TYPES.iter().position(|t| *t == tx_type)
}

/// Fold one batch of flattened records into exactly one canonical row.
///
/// Computes the four independent breakdowns (status, type, type|Success,
/// type|Failed), merges them on the batch key, zero-fills unobserved
/// categories and derives `Total = Status_Success + Status_Failed`.
/// Idempotent: re-running on the same batch yields the same row.
///
/// Returns `None` for an empty batch.
pub fn fold_batch(records: &[TxRecord]) -> Option<AggregateRow> {
    let min_slot_timestamp = records.iter().map(|r| r.slot_timestamp).min()?;
    let max_slot_number = records.iter().map(|r| r.slot_number).max()?;

    let by_status = count_by_status(records);
    let by_type = count_by_type(records, None);
    let by_type_success = count_by_type(records, Some(TxStatus::Success));
    let by_type_failed = count_by_type(records, Some(TxStatus::Failed));

    let mut row = AggregateRow::zeroed(min_slot_timestamp, max_slot_number);
    row.status_success = by_status.get(&TxStatus::Success).copied().unwrap_or(0);
    row.status_failed = by_status.get(&TxStatus::Failed).copied().unwrap_or(0);

    for (i, tx_type) in CANONICAL_TYPES.iter().enumerate() {
        row.type_counts[i] = by_type.get(tx_type).copied().unwrap_or(0);
        row.success_counts[i] = by_type_success.get(tx_type).copied().unwrap_or(0);
        row.failed_counts[i] = by_type_failed.get(tx_type).copied().unwrap_or(0);
    }

    row.total = row.status_success + row.status_failed;
    Some(row)
}

fn count_by_status(records: &[TxRecord]) -> HashMap<TxStatus, u64> {
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(record.status).or_insert(0) += 1;
    }
    counts
}

fn count_by_type(records: &[TxRecord], status: Option<TxStatus>) -> HashMap<TxType, u64> {
    let mut counts = HashMap::new();
    for record in records {
        if status.is_some_and(|s| record.status != s) {
            continue;
        }
        *counts.entry(record.tx_type).or_insert(0) += 1;
    }
    counts
}

/// Append a row to the running table, keeping it sorted ascending by
/// `Min_Slot_Timestamp`. The sort is stable, so equal-timestamp rows keep
/// their insertion order.
pub fn merge_row(table: &mut Vec<AggregateRow>, row: AggregateRow) {
    table.push(row);
    table.sort_by_key(|r| r.min_slot_timestamp);
}

/// Ad-hoc count of records grouped by a named dimension.
///
/// Supported selectors: `status`, `type`. Anything else fails with
/// `InvalidArgument` naming the valid set.
pub fn count_by_dimension(
    records: &[TxRecord],
    selector: &str,
) -> Result<HashMap<String, u64>, TrackerError> {
    const VALID: &[&str] = &["status", "type"];

    let mut counts = HashMap::new();
    match selector {
        "status" => {
            for record in records {
                *counts.entry(record.status.as_str().to_string()).or_insert(0) += 1;
            }
        }
        "type" => {
            for record in records {
                *counts.entry(record.tx_type.as_str().to_string()).or_insert(0) += 1;
            }
        }
        other => {
            return Err(TrackerError::InvalidArgument {
                given: other.to_string(),
                valid: VALID,
            })
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        slot_number: u64,
        slot_timestamp: i64,
        status: TxStatus,
        tx_type: TxType,
    ) -> TxRecord {
        TxRecord {
            slot_number,
            slot_timestamp,
            batch_number: 1,
            signature: format!("sig-{}-{}", slot_number, slot_timestamp),
            status,
            tx_type,
        }
    }

    #[test]
    fn test_fold_batch_counts() {
        // 3 Success/ComputeBudget, 2 Failed/Transaction, 1 Success/Vote.
        let records = vec![
            record(10, 1000, TxStatus::Success, TxType::ComputeBudget),
            record(10, 1000, TxStatus::Success, TxType::ComputeBudget),
            record(11, 1002, TxStatus::Success, TxType::ComputeBudget),
            record(11, 1002, TxStatus::Failed, TxType::Transaction),
            record(12, 1004, TxStatus::Failed, TxType::Transaction),
            record(12, 1004, TxStatus::Success, TxType::Vote),
        ];

        let row = fold_batch(&records).unwrap();
        assert_eq!(row.min_slot_timestamp, 1000);
        assert_eq!(row.max_slot_number, 12);
        assert_eq!(row.status_success, 4);
        assert_eq!(row.status_failed, 2);
        assert_eq!(row.total, 6);
        assert_eq!(row.success_count(TxType::ComputeBudget), Some(3));
        assert_eq!(row.success_count(TxType::Vote), Some(1));
        assert_eq!(row.failed_count(TxType::Transaction), Some(2));
        assert_eq!(row.type_count(TxType::ComputeBudget), Some(3));
        assert_eq!(row.type_count(TxType::Transaction), Some(2));
        assert_eq!(row.type_count(TxType::Vote), Some(1));
        // Everything unobserved stays a zero-filled column.
        assert_eq!(row.type_count(TxType::CancelOrder), Some(0));
        assert_eq!(row.success_count(TxType::System), Some(0));
        assert_eq!(row.failed_count(TxType::Unknown), Some(0));
    }

    #[test]
    fn test_total_excludes_unknown_status() {
        let records = vec![
            record(1, 100, TxStatus::Success, TxType::Vote),
            record(1, 100, TxStatus::Unknown, TxType::Unknown),
        ];
        let row = fold_batch(&records).unwrap();
        assert_eq!(row.status_success, 1);
        assert_eq!(row.status_failed, 0);
        assert_eq!(row.total, 1);
    }

    #[test]
    fn test_non_canonical_types_counted_in_status_only() {
        let records = vec![
            record(1, 100, TxStatus::Success, TxType::UpdatePrice),
            record(1, 100, TxStatus::Success, TxType::Oracle),
        ];
        let row = fold_batch(&records).unwrap();
        assert_eq!(row.status_success, 2);
        assert_eq!(row.total, 2);
        assert_eq!(row.type_count(TxType::UpdatePrice), None);
        assert_eq!(row.type_counts.iter().sum::<u64>(), 0);
    }

    #[test]
    fn test_fold_batch_is_idempotent() {
        let records = vec![
            record(5, 500, TxStatus::Success, TxType::Transaction),
            record(6, 501, TxStatus::Failed, TxType::CancelOrder),
        ];
        assert_eq!(fold_batch(&records), fold_batch(&records));
    }

    #[test]
    fn test_fold_empty_batch() {
        assert!(fold_batch(&[]).is_none());
    }

    #[test]
    fn test_merge_keeps_table_sorted() {
        let mut table = Vec::new();
        let mk = |ts: i64| {
            let records = vec![record(1, ts, TxStatus::Success, TxType::Vote)];
            fold_batch(&records).unwrap()
        };
        merge_row(&mut table, mk(300));
        merge_row(&mut table, mk(100));
        merge_row(&mut table, mk(200));

        let timestamps: Vec<i64> = table.iter().map(|r| r.min_slot_timestamp).collect();
        assert_eq!(timestamps, vec![100, 200, 300]);
    }

    #[test]
    fn test_count_by_dimension() {
        let records = vec![
            record(1, 100, TxStatus::Success, TxType::Vote),
            record(1, 100, TxStatus::Failed, TxType::Vote),
        ];
        let by_status = count_by_dimension(&records, "status").unwrap();
        assert_eq!(by_status.get("Success"), Some(&1));
        assert_eq!(by_status.get("Failed"), Some(&1));

        let by_type = count_by_dimension(&records, "type").unwrap();
        assert_eq!(by_type.get("Vote"), Some(&2));

        let err = count_by_dimension(&records, "program").unwrap_err();
        match err {
            TrackerError::InvalidArgument { given, valid } => {
                assert_eq!(given, "program");
                assert_eq!(valid, &["status", "type"][..]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
