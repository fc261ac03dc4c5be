//! Tracker service
//!
//! Owns the explorer behind a mutex and drives it from a background task:
//! one update pass per tick, each pass running to completion before the
//! lock is released. The presentation layer never touches the ledger; it
//! reads cloned [`TrackerSnapshot`]s taken under the lock.
//!
//! First pass bootstrap: load the persisted table when one exists,
//! otherwise bulk-explore backward-looking history starting at
//! `latest - n_batches_to_explore * jump`. Every later pass refreshes the
//! latest validated slot, catches up window by window and persists.

use crate::aggregate::AggregateRow;
use crate::discovery::{CatchUpStatus, Direction, SlotExplorer};
use crate::error::TrackerError;
use crate::rpc::SlotSource;
use crate::store::CsvTableStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct TrackerSnapshot {
    /// The running table, sorted ascending by `Min_Slot_Timestamp`.
    pub rows: Vec<AggregateRow>,
    /// Highest validated slot number on the remote source.
    pub latest_validated: u64,
    /// Highest slot number folded into the table.
    pub cursor: Option<u64>,
}

pub struct TrackerService<S: SlotSource> {
    explorer: Mutex<SlotExplorer<S>>,
    store: CsvTableStore,
    refresh_interval: Duration,
}

impl<S: SlotSource> TrackerService<S> {
    pub fn new(explorer: SlotExplorer<S>, store: CsvTableStore) -> Self {
        let refresh_interval =
            Duration::from_secs(explorer.config().refresh_interval_secs);
        Self {
            explorer: Mutex::new(explorer),
            store,
            refresh_interval,
        }
    }

    /// Take a consistent snapshot of the current state. The lock is held
    /// only for the clone, so readers never observe a half-merged table.
    pub async fn snapshot(&self) -> TrackerSnapshot {
        let explorer = self.explorer.lock().await;
        let ledger = explorer.ledger();
        TrackerSnapshot {
            rows: ledger.table().to_vec(),
            latest_validated: ledger.latest_validated(),
            cursor: ledger.cursor(),
        }
    }

    /// Run one update pass to completion.
    pub async fn run_update_pass(&self) -> Result<(), TrackerError> {
        let mut explorer = self.explorer.lock().await;
        let latest = explorer.refresh_latest().await?;

        if !explorer.ledger().is_initialized() {
            if self.store.exists() {
                let rows = self.store.load()?;
                explorer.ledger_mut().restore(rows);
                log::info!(
                    "Resuming from persisted table, cursor at {:?}",
                    explorer.ledger().cursor()
                );
                return Ok(());
            }

            let config = explorer.config();
            let span = config.n_batches_to_explore * config.jump;
            let start = latest.saturating_sub(span).max(1);
            log::info!("No persisted table, bulk exploring from slot #{}", start);
            explorer.explore_chain(start, Direction::Forward).await;
            self.store.save(explorer.ledger().table())?;
            return Ok(());
        }

        match explorer.catch_up(None).await? {
            CatchUpStatus::UpToDate => {}
            CatchUpStatus::Advanced(windows) => {
                log::info!("Caught up {} window(s)", windows);
                self.store.save(explorer.ledger().table())?;
            }
        }
        Ok(())
    }

    /// Unbounded update loop: one pass, then sleep the refresh interval.
    pub async fn run(&self) {
        log::info!(
            "Tracker service started (refresh every {:?})",
            self.refresh_interval
        );
        loop {
            if let Err(e) = self.run_update_pass().await {
                log::error!("Update pass failed: {}", e);
            }
            tokio::time::sleep(self.refresh_interval).await;
        }
    }

    /// Spawn the update loop as a background task.
    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()>
    where
        S: 'static,
    {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.run().await })
    }
}
