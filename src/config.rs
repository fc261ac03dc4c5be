//! Explorer configuration
//!
//! Loaded from environment variables with defaults, optionally overridden
//! by a JSON settings file (`n_batches_to_explore`, `jumps`,
//! `seconds_per_batch`).

use crate::classifier::ComputeBudgetMatching;
use crate::error::TrackerError;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// JSON-RPC endpoint of the remote ledger.
    pub rpc_url: String,
    /// Windows per exploration run.
    pub n_batches_to_explore: u64,
    /// Slot-number span of one outer search window.
    pub jump: u64,
    /// Time tolerance for slots to share a batch, in seconds. Zero
    /// disables batching: every fetched slot is a singleton batch.
    pub seconds_per_batch: i64,
    /// Blocking pause before each remote probe, in milliseconds.
    pub probe_delay_ms: u64,
    /// Sleep between background update passes, in seconds.
    pub refresh_interval_secs: u64,
    /// Path of the persisted canonical table.
    pub table_path: String,
    /// Discard the raw slot buffer after each fold (bounded memory).
    pub flush_slots: bool,
    /// How the compute-budget classification rule inspects instructions.
    pub compute_budget_matching: ComputeBudgetMatching,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            n_batches_to_explore: 5,
            jump: 1000,
            seconds_per_batch: 1,
            probe_delay_ms: 1500,
            refresh_interval_secs: 20,
            table_path: "data/chain.csv".to_string(),
            flush_slots: true,
            compute_budget_matching: ComputeBudgetMatching::Strict,
        }
    }
}

impl ExplorerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables (all optional):
    /// - `SLOTFLOW_RPC_URL` (default: mainnet public endpoint)
    /// - `SLOTFLOW_N_BATCHES` (default: 5)
    /// - `SLOTFLOW_JUMP` (default: 1000)
    /// - `SLOTFLOW_SECONDS_PER_BATCH` (default: 1)
    /// - `SLOTFLOW_PROBE_DELAY_MS` (default: 1500)
    /// - `SLOTFLOW_REFRESH_INTERVAL_SECS` (default: 20)
    /// - `SLOTFLOW_TABLE_PATH` (default: data/chain.csv)
    /// - `SLOTFLOW_FLUSH_SLOTS` (default: true)
    /// - `SLOTFLOW_COMPUTE_BUDGET_MATCHING` (`strict` | `relaxed`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rpc_url: env::var("SLOTFLOW_RPC_URL").unwrap_or(defaults.rpc_url),
            n_batches_to_explore: parse_env("SLOTFLOW_N_BATCHES", defaults.n_batches_to_explore),
            jump: parse_env("SLOTFLOW_JUMP", defaults.jump),
            seconds_per_batch: parse_env("SLOTFLOW_SECONDS_PER_BATCH", defaults.seconds_per_batch),
            probe_delay_ms: parse_env("SLOTFLOW_PROBE_DELAY_MS", defaults.probe_delay_ms),
            refresh_interval_secs: parse_env(
                "SLOTFLOW_REFRESH_INTERVAL_SECS",
                defaults.refresh_interval_secs,
            ),
            table_path: env::var("SLOTFLOW_TABLE_PATH").unwrap_or(defaults.table_path),
            flush_slots: parse_env("SLOTFLOW_FLUSH_SLOTS", defaults.flush_slots),
            compute_budget_matching: match env::var("SLOTFLOW_COMPUTE_BUDGET_MATCHING").as_deref()
            {
                Ok("relaxed") => ComputeBudgetMatching::Relaxed,
                _ => ComputeBudgetMatching::Strict,
            },
        }
    }

    /// Override the exploration knobs from a JSON settings file.
    ///
    /// Accepts the legacy `jumps` key as an alias of `jump`.
    pub fn apply_settings_file(&mut self, path: impl AsRef<Path>) -> Result<(), TrackerError> {
        let raw = fs::read_to_string(path)?;
        let settings: SettingsFile = serde_json::from_str(&raw)
            .map_err(|e| TrackerError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        if let Some(n) = settings.n_batches_to_explore {
            self.n_batches_to_explore = n;
        }
        if let Some(jump) = settings.jump {
            self.jump = jump;
        }
        if let Some(secs) = settings.seconds_per_batch {
            self.seconds_per_batch = secs;
        }

        log::info!(
            "Loaded settings::N_BATCHES={}::JUMP={}::SECONDS_PER_BATCH={}",
            self.n_batches_to_explore,
            self.jump,
            self.seconds_per_batch
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    n_batches_to_explore: Option<u64>,
    #[serde(alias = "jumps")]
    jump: Option<u64>,
    seconds_per_batch: Option<i64>,
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ExplorerConfig::default();
        assert_eq!(config.n_batches_to_explore, 5);
        assert_eq!(config.jump, 1000);
        assert_eq!(config.seconds_per_batch, 1);
        assert_eq!(config.compute_budget_matching, ComputeBudgetMatching::Strict);
    }

    #[test]
    fn test_settings_file_with_legacy_jumps_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"n_batches_to_explore": 8, "jumps": 500, "seconds_per_batch": 0}}"#
        )
        .unwrap();

        let mut config = ExplorerConfig::default();
        config.apply_settings_file(file.path()).unwrap();
        assert_eq!(config.n_batches_to_explore, 8);
        assert_eq!(config.jump, 500);
        assert_eq!(config.seconds_per_batch, 0);
    }

    #[test]
    fn test_settings_file_partial_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"jump": 250}}"#).unwrap();

        let mut config = ExplorerConfig::default();
        config.apply_settings_file(file.path()).unwrap();
        assert_eq!(config.jump, 250);
        assert_eq!(config.n_batches_to_explore, 5);
    }
}
