//! Slot discovery engine
//!
//! Two nested searches drive discovery. The outer search walks slot
//! numbers across the configured range in fixed windows of `jump` slots.
//! Once it finds a fetchable slot inside a window it hands that slot to
//! the boundary search, which extends the batch one slot at a time while
//! timestamps stay inside the tolerance window.
//!
//! Every probe outcome is a tagged [`ProbeResult`]; a missing slot is
//! never fatal, it only advances the probe offset. One probe is in flight
//! at a time and a blocking pause precedes every probe, because the public
//! RPC endpoints rate-limit aggressively.

use crate::config::ExplorerConfig;
use crate::error::TrackerError;
use crate::ledger::ChainLedger;
use crate::rpc::SlotSource;
use crate::slot::Slot;
use async_trait::async_trait;
use std::time::Duration;

/// Direction of a slot-number walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn step(&self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Outcome of probing one window position.
#[derive(Debug)]
pub enum ProbeResult {
    /// A complete batch of slots inside the tolerance window.
    Found(Vec<Slot>),
    /// The boundary search hit a gap; the outer loop should skip the
    /// probe offset past it by `|shift|`.
    Miss(i64),
    /// The remote source had no data at the probed position itself.
    Unavailable,
}

/// Outcome of an incremental catch-up pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchUpStatus {
    /// The next window would exceed the latest validated slot; nothing
    /// was fetched.
    UpToDate,
    /// Number of windows explored.
    Advanced(u64),
}

/// Injectable delay source so discovery timing is controllable in tests.
#[async_trait]
pub trait DelaySource: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Production delay: a real async sleep.
pub struct TokioDelay;

#[async_trait]
impl DelaySource for TokioDelay {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Zero-cost delay for tests.
pub struct NoDelay;

#[async_trait]
impl DelaySource for NoDelay {
    async fn pause(&self, _duration: Duration) {}
}

/// Drives remote probing, boundary search and batching, committing found
/// batches into the owned [`ChainLedger`].
pub struct SlotExplorer<S: SlotSource> {
    source: S,
    ledger: ChainLedger,
    config: ExplorerConfig,
    delay: Box<dyn DelaySource>,
}

impl<S: SlotSource> SlotExplorer<S> {
    pub fn new(source: S, config: ExplorerConfig) -> Self {
        Self::with_delay(source, config, Box::new(TokioDelay))
    }

    pub fn with_delay(source: S, config: ExplorerConfig, delay: Box<dyn DelaySource>) -> Self {
        Self {
            source,
            ledger: ChainLedger::new(),
            config,
            delay,
        }
    }

    pub fn ledger(&self) -> &ChainLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ChainLedger {
        &mut self.ledger
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Ask the remote source for its highest validated slot and record it
    /// on the ledger.
    pub async fn refresh_latest(&mut self) -> Result<u64, TrackerError> {
        let latest = self.source.latest_slot().await?;
        self.ledger.set_latest_validated(latest);
        log::debug!("Latest validated slot: {}", latest);
        Ok(latest)
    }

    async fn pause(&self) {
        self.delay
            .pause(Duration::from_millis(self.config.probe_delay_ms))
            .await;
    }

    /// Fetch and build one slot. A malformed block is handled exactly like
    /// a missing slot: logged and skipped, never fatal.
    async fn fetch_slot(&self, slot_number: u64) -> Option<Slot> {
        let block = self.source.block(slot_number).await?;
        match Slot::from_block(slot_number, &block, self.config.compute_budget_matching) {
            Ok(slot) => Some(slot),
            Err(e) => {
                log::warn!("Discarding slot #{}: {}", slot_number, e);
                None
            }
        }
    }

    fn within_tolerance(&self, ref_timestamp: i64, timestamp: i64) -> bool {
        (ref_timestamp - timestamp).abs() <= self.config.seconds_per_batch
    }

    /// Boundary search: extend a batch from a reference slot, one slot at
    /// a time in the given direction, while timestamps stay within
    /// tolerance.
    ///
    /// A gap (slot with no data) aborts the batch and reports the current
    /// shift so the outer loop can skip past it. The search also stops at
    /// the latest validated slot, and when a candidate's timestamp falls
    /// outside the tolerance window the batch is complete without it.
    async fn find_slots_within_time_range(
        &self,
        reference: Slot,
        direction: Direction,
    ) -> ProbeResult {
        let ref_number = reference.number() as i64;
        let ref_timestamp = reference.timestamp();
        let latest = self.ledger.latest_validated() as i64;
        let step = direction.step();

        let mut found = vec![reference];
        let mut shift = step;

        loop {
            self.pause().await;

            let candidate_number = ref_number + shift;
            if candidate_number < 1 {
                break;
            }

            match self.fetch_slot(candidate_number as u64).await {
                None => return ProbeResult::Miss(shift),
                Some(slot) => {
                    if !self.within_tolerance(ref_timestamp, slot.timestamp()) {
                        break;
                    }
                    found.push(slot);
                    shift += step;
                    if ref_number + shift > latest {
                        break;
                    }
                }
            }
        }

        ProbeResult::Found(found)
    }

    /// Probe one window position: fetch the slot, then pull its full batch
    /// via the boundary search. With a zero tolerance window the fetched
    /// slot is a singleton batch and no boundary search runs.
    async fn probe(&self, slot_number: u64, direction: Direction) -> ProbeResult {
        self.pause().await;

        let slot = match self.fetch_slot(slot_number).await {
            Some(slot) => slot,
            None => return ProbeResult::Unavailable,
        };

        if self.config.seconds_per_batch == 0 {
            return ProbeResult::Found(vec![slot]);
        }

        self.find_slots_within_time_range(slot, direction).await
    }

    /// Advance a probe offset through one window until a batch is found or
    /// the window is exhausted. Always makes forward progress: every miss
    /// moves the offset by at least one slot.
    async fn search_window(&self, window_start: u64, direction: Direction) -> Vec<Slot> {
        let start = window_start as i64;
        let jump = self.config.jump as i64;
        let latest = self.ledger.latest_validated() as i64;
        let step = direction.step();
        let mut offset: i64 = 0;

        while offset < jump {
            let candidate = start + step * offset;
            if candidate < 1 {
                break;
            }
            if direction == Direction::Forward && candidate > latest {
                break;
            }

            match self.probe(candidate as u64, direction).await {
                ProbeResult::Found(batch) => {
                    log::info!(
                        "Found {} slot(s) around #{}",
                        batch.len(),
                        candidate
                    );
                    return batch;
                }
                ProbeResult::Miss(shift) => {
                    log::debug!("Slots not found. Searching new batch...");
                    offset += shift.abs();
                }
                ProbeResult::Unavailable => {
                    log::debug!("Slot #{} not found", candidate);
                    offset += 1;
                }
            }
        }

        Vec::new()
    }

    /// Walk the chain from a starting slot number, one window per step,
    /// committing each found batch to the ledger.
    ///
    /// Stops after `n_batches_to_explore` windows, at the latest validated
    /// slot (forward), or below slot 1 (backward).
    pub async fn explore_chain(&mut self, starting_slot_number: u64, direction: Direction) {
        let mut slot_number = starting_slot_number as i64;
        let jump = self.config.jump as i64;
        let total = self.config.n_batches_to_explore;
        let mut windows = 0;

        while windows < total {
            let latest = self.ledger.latest_validated() as i64;
            if direction == Direction::Forward && slot_number >= latest {
                break;
            }
            if direction == Direction::Backward && slot_number < 1 {
                break;
            }

            log::info!("Fetching slot #{} ({} of {})", slot_number, windows + 1, total);

            let found = self.search_window(slot_number as u64, direction).await;
            if !found.is_empty() {
                log::info!(
                    "Added {} slot(s), highest #{}",
                    found.len(),
                    found.iter().map(Slot::number).max().unwrap_or(0)
                );
                self.ledger.add_batch(found, self.config.flush_slots);
            }

            slot_number += direction.step() * jump;
            windows += 1;
            self.pause().await;
        }

        log::info!("All data retrieved.");
    }

    /// Incremental catch-up: resume forward from the cursor, window by
    /// window, until the next window would exceed the latest validated
    /// slot. Requires a loaded (or previously populated) table.
    ///
    /// `max_windows` bounds one pass; `None` runs until up to date.
    pub async fn catch_up(
        &mut self,
        max_windows: Option<u64>,
    ) -> Result<CatchUpStatus, TrackerError> {
        self.ledger.ensure_initialized()?;
        let cursor = self.ledger.cursor().ok_or(TrackerError::NotInitialized)?;
        let latest = self.ledger.latest_validated();
        let jump = self.config.jump;

        if cursor >= latest || cursor + jump > latest {
            log::info!("Chain up to date.");
            return Ok(CatchUpStatus::UpToDate);
        }

        let mut slot_number = cursor;
        let mut windows = 0u64;

        while slot_number + jump <= latest && max_windows.map_or(true, |m| windows < m) {
            slot_number += jump;
            log::info!(
                "Fetching slot #{} (latest validated: {})",
                slot_number,
                latest
            );

            let found = self.search_window(slot_number, Direction::Forward).await;
            if !found.is_empty() {
                self.ledger.add_batch(found, self.config.flush_slots);
            }

            windows += 1;
            self.pause().await;
        }

        Ok(CatchUpStatus::Advanced(windows))
    }
}
