//! slotflow — time-batched slot discovery and transaction classification
//!
//! Ingests blocks ("slots") from a remote ledger RPC endpoint, discovers
//! contiguous runs of slots whose timestamps cluster within a tolerance
//! window, classifies every transaction by outcome and semantic type, and
//! folds the classified batches into a running, schema-stable count table.
//!
//! # Architecture
//!
//! ```text
//! SlotSource (JSON-RPC) → SlotExplorer (window + boundary search)
//!     ↓
//! Slot / Transaction (classifier: ordered rule table)
//!     ↓
//! ChainLedger (dedup, batch counter) → fold_batch → AggregateRow
//!     ↓
//! CsvTableStore (canonical schema) + TrackerService snapshots
//! ```

pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod discovery;
pub mod error;
pub mod ledger;
pub mod rpc;
pub mod service;
pub mod slot;
pub mod store;

pub use aggregate::{AggregateRow, CANONICAL_TYPES, COLUMNS};
pub use classifier::{ComputeBudgetMatching, TxStatus, TxType};
pub use config::ExplorerConfig;
pub use discovery::{CatchUpStatus, DelaySource, Direction, NoDelay, ProbeResult, SlotExplorer, TokioDelay};
pub use error::TrackerError;
pub use ledger::ChainLedger;
pub use rpc::{BlockPayload, HttpSlotSource, SlotSource};
pub use service::{TrackerService, TrackerSnapshot};
pub use slot::{Slot, Transaction, TxRecord};
pub use store::CsvTableStore;
