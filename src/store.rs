//! CSV persistence for the canonical table
//!
//! Writes and reads the running aggregate table in the exact canonical
//! column order, with `Min_Slot_Timestamp` serialized as
//! `YYYY-MM-DD HH:MM:SS`.

use crate::aggregate::{AggregateRow, COLUMNS};
use crate::error::TrackerError;
use chrono::{DateTime, NaiveDateTime};
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvTableStore {
    path: PathBuf,
}

impl CsvTableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Persist the table. An empty table writes nothing.
    pub fn save(&self, table: &[AggregateRow]) -> Result<(), TrackerError> {
        if table.is_empty() {
            log::warn!("Empty chain dataset, nothing to persist.");
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(COLUMNS)?;
        for row in table {
            writer.write_record(row_fields(row))?;
        }
        writer.flush()?;

        log::debug!("Persisted {} rows to {}", table.len(), self.path.display());
        Ok(())
    }

    /// Load the table back; rows come out in file order and the caller
    /// re-sorts on restore.
    pub fn load(&self) -> Result<Vec<AggregateRow>, TrackerError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(row_from_record(&record?)?);
        }
        log::info!("Loaded {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

fn format_timestamp(epoch: i64) -> String {
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

fn parse_timestamp(raw: &str) -> Result<i64, TrackerError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|e| invalid_data(format!("bad timestamp {:?}: {}", raw, e)))
}

fn invalid_data(detail: String) -> TrackerError {
    TrackerError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, detail))
}

fn row_fields(row: &AggregateRow) -> Vec<String> {
    let mut fields = Vec::with_capacity(COLUMNS.len());
    fields.push(format_timestamp(row.min_slot_timestamp));
    fields.push(row.max_slot_number.to_string());
    for count in row
        .type_counts
        .iter()
        .chain(row.success_counts.iter())
        .chain(row.failed_counts.iter())
    {
        fields.push(count.to_string());
    }
    fields.push(row.status_failed.to_string());
    fields.push(row.status_success.to_string());
    fields.push(row.total.to_string());
    fields
}

fn row_from_record(record: &csv::StringRecord) -> Result<AggregateRow, TrackerError> {
    if record.len() != COLUMNS.len() {
        return Err(invalid_data(format!(
            "expected {} columns, found {}",
            COLUMNS.len(),
            record.len()
        )));
    }

    let count = |index: usize| -> Result<u64, TrackerError> {
        let raw = record.get(index).unwrap_or("");
        raw.parse()
            .map_err(|e| invalid_data(format!("bad count in column {}: {}", COLUMNS[index], e)))
    };

    let mut type_counts = [0u64; 6];
    let mut success_counts = [0u64; 6];
    let mut failed_counts = [0u64; 6];
    for i in 0..6 {
        type_counts[i] = count(2 + i)?;
        success_counts[i] = count(8 + i)?;
        failed_counts[i] = count(14 + i)?;
    }

    Ok(AggregateRow {
        min_slot_timestamp: parse_timestamp(record.get(0).unwrap_or(""))?,
        max_slot_number: count(1)?,
        type_counts,
        success_counts,
        failed_counts,
        status_failed: count(20)?,
        status_success: count(21)?,
        total: count(22)?,
    })
}
