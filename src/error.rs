//! Error types for the tracker
//!
//! One crate-wide error enum; variants map to the failure modes of the
//! classifier, ledger, aggregation and storage layers. Remote "no data for
//! this slot" is not an error at all: the RPC layer reports it as an
//! absence and the discovery loop skips past it.

use std::fmt;

#[derive(Debug)]
pub enum TrackerError {
    /// A raw transaction record carried no signature.
    MalformedRecord { slot: u64, detail: String },
    /// A ledger operation that needs a loaded table was called before
    /// `load()` or an initial bulk exploration.
    NotInitialized,
    /// A caller asked for an unsupported grouping/classification selector.
    InvalidArgument {
        given: String,
        valid: &'static [&'static str],
    },
    /// The remote source answered but the payload was unusable.
    Remote(String),
    Io(std::io::Error),
    Csv(csv::Error),
    Rpc(reqwest::Error),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::MalformedRecord { slot, detail } => {
                write!(f, "malformed record in slot {}: {}", slot, detail)
            }
            TrackerError::NotInitialized => {
                write!(f, "ledger not initialized: load a table or run an initial exploration first")
            }
            TrackerError::InvalidArgument { given, valid } => {
                write!(f, "unsupported selector {:?}, valid: {:?}", given, valid)
            }
            TrackerError::Remote(detail) => write!(f, "remote source error: {}", detail),
            TrackerError::Io(e) => write!(f, "IO error: {}", e),
            TrackerError::Csv(e) => write!(f, "CSV error: {}", e),
            TrackerError::Rpc(e) => write!(f, "RPC error: {}", e),
        }
    }
}

impl std::error::Error for TrackerError {}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::Io(err)
    }
}

impl From<csv::Error> for TrackerError {
    fn from(err: csv::Error) -> Self {
        TrackerError::Csv(err)
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        TrackerError::Rpc(err)
    }
}
