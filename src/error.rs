use std::io;
use std::path::PathBuf;

/// Errors surfaced by ledger storage. None of them are retried here.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The backing file could not be read, written or replaced.
    #[error("ledger storage unavailable at {path}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Persisted content does not have the ledger shape. Never auto-repaired.
    #[error("malformed ledger at {path}: {reason}")]
    MalformedLedger { path: PathBuf, reason: String },

    #[error("failed to encode ledger: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An append precondition was not met.
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// The ledger changed on disk since the caller's fingerprint was taken.
    #[error("ledger at {path} was modified concurrently")]
    Conflict { path: PathBuf },
}

impl LedgerError {
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedLedger {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
