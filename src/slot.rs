//! Slot and transaction models
//!
//! A [`Slot`] is one discrete unit of the remote ledger: its number, block
//! timestamp, the batch it was discovered in, and its classified
//! transactions. Both models are immutable after construction except for
//! the batch number, which the ledger assigns when it groups slots.

use crate::classifier::{
    classify_status, classify_type, ComputeBudgetMatching, ErrorIndicator, InstructionSummary,
    TxStatus, TxType,
};
use crate::error::TrackerError;
use crate::rpc::{BlockPayload, RawTransaction};
use std::fmt;

/// One classified transaction. Built exactly once from one raw record.
#[derive(Debug, Clone)]
pub struct Transaction {
    signature: String,
    status: TxStatus,
    tx_type: TxType,
    logs: Vec<String>,
    instructions: Vec<InstructionSummary>,
}

impl Transaction {
    /// Build and classify a transaction from a raw record.
    ///
    /// Fails with `MalformedRecord` when the record carries no signature.
    pub fn from_raw(
        slot_number: u64,
        raw: &RawTransaction,
        matching: ComputeBudgetMatching,
    ) -> Result<Self, TrackerError> {
        let signature = raw
            .transaction
            .signatures
            .first()
            .cloned()
            .ok_or_else(|| TrackerError::MalformedRecord {
                slot: slot_number,
                detail: "missing signature".to_string(),
            })?;

        let err = match raw.meta.as_ref() {
            None => ErrorIndicator::Undetermined,
            Some(meta) => match &meta.err {
                None => ErrorIndicator::Undetermined,
                Some(None) => ErrorIndicator::Clear,
                Some(Some(_)) => ErrorIndicator::Raised,
            },
        };

        let logs = raw
            .meta
            .as_ref()
            .and_then(|m| m.log_messages.clone())
            .unwrap_or_default();

        // An empty instruction list becomes one synthetic instruction with
        // no parsed type and no program id, so the first-instruction rules
        // fall through to the log-scanning rules.
        let mut instructions: Vec<InstructionSummary> = raw
            .transaction
            .message
            .instructions
            .iter()
            .map(|ins| InstructionSummary {
                parsed_type: ins.parsed_type().map(str::to_string),
                program_id: ins.program_id.clone(),
            })
            .collect();
        if instructions.is_empty() {
            instructions.push(InstructionSummary {
                parsed_type: None,
                program_id: None,
            });
        }

        let status = classify_status(err);
        let tx_type = classify_type(&instructions, &logs, matching);

        Ok(Self {
            signature,
            status,
            tx_type,
            logs,
            instructions,
        })
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn status(&self) -> TxStatus {
        self.status
    }

    pub fn tx_type(&self) -> TxType {
        self.tx_type
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn instructions(&self) -> &[InstructionSummary] {
        &self.instructions
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signature: {} - Type: {} - Status: {}",
            self.signature,
            self.tx_type.as_str(),
            self.status.as_str()
        )
    }
}

/// One slot with its classified transactions.
#[derive(Debug, Clone)]
pub struct Slot {
    number: u64,
    timestamp: i64,
    batch_number: Option<u64>,
    transactions: Vec<Transaction>,
}

impl Slot {
    /// Build a slot from a fetched block, classifying every transaction.
    ///
    /// A malformed record aborts the whole slot; the discovery loop treats
    /// that the same way it treats a missing slot and skips past it.
    pub fn from_block(
        number: u64,
        block: &BlockPayload,
        matching: ComputeBudgetMatching,
    ) -> Result<Self, TrackerError> {
        let transactions = block
            .transactions
            .iter()
            .map(|raw| Transaction::from_raw(number, raw, matching))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            number,
            timestamp: block.block_time,
            batch_number: None,
            transactions,
        })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn batch_number(&self) -> Option<u64> {
        self.batch_number
    }

    pub fn set_batch_number(&mut self, batch_number: u64) {
        self.batch_number = Some(batch_number);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Flatten into transaction-level records for aggregation.
    pub fn records(&self) -> Vec<TxRecord> {
        let batch_number = self.batch_number.unwrap_or(0);
        self.transactions
            .iter()
            .map(|tx| TxRecord {
                slot_number: self.number,
                slot_timestamp: self.timestamp,
                batch_number,
                signature: tx.signature.clone(),
                status: tx.status,
                tx_type: tx.tx_type,
            })
            .collect()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} - Timestamp: {}", self.number, self.timestamp)
    }
}

/// One row of the flattened transaction-level table.
#[derive(Debug, Clone)]
pub struct TxRecord {
    pub slot_number: u64,
    pub slot_timestamp: i64,
    pub batch_number: u64,
    pub signature: String,
    pub status: TxStatus,
    pub tx_type: TxType,
}
